//! File rotation example
//!
//! Writes enough records to roll a size-limited file several times and an
//! XML file with header and trailer.
//!
//! Run with: cargo run --example file_rotation

use category_logger::prelude::*;
use category_logger::info;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Category Logger - File Rotation Example ===\n");

    let rotating = Arc::new(
        FileWriter::builder("rotation_demo.log")
            .pattern("[%D %T] [%L] %M")
            .rotation(
                RotationPolicy::new()
                    .with_max_bytes(category_logger::parse_size("4K", 1024)?)
                    .with_max_backup(3)
                    .with_keep_history(true),
            )
            .sanitize(true)
            .build()?,
    );
    let xml = FileWriter::builder("rotation_demo.xml").xml().build()?;

    let registry = Arc::new(Registry::new(Level::Info, rotating.clone()));
    registry.register("audit", Level::Info, Arc::new(xml));

    let app = registry.logger("app");
    for i in 0..400 {
        info!(app, "processing item {} of 400", i);
    }

    // Embedded newlines are escaped in the rotating file
    app.warn("multi\nline\nmessage");

    let audit = registry.logger("audit");
    info!(audit, "user {} changed role to {}", "alice", "admin");

    rotating.rotate();
    registry.close();

    let metrics = rotating.metrics();
    println!("Rotations:     {}", metrics.rotation_count());
    println!("Records:       {}", metrics.written_count());
    println!("Live file:     {} bytes", metrics.current_bytes());

    println!("\n=== Example completed successfully! ===");
    println!("Check 'rotation_demo.log', its '.1'..'.3' backups and 'rotation_demo.xml'");
    Ok(())
}
