//! Category routing example
//!
//! Routes a "db" category to its own file while everything at WARN and
//! above is mirrored to the console.
//!
//! Run with: cargo run --example category_routing

use category_logger::prelude::*;
use category_logger::{debug, error, info, warn};
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    println!("=== Category Logger - Routing Example ===\n");

    let console = ConsoleWriter::builder()
        .pattern("[%t] [%C] [%L] %M")
        .colors(true)
        .build()?;
    let registry = Arc::new(Registry::new(Level::Warn, Arc::new(console)));

    let db_file = FileWriter::builder("routing_db.log")
        .pattern("[%D %T] [%L] (%S) %M")
        .build()?;
    registry.register("db", Level::Debug, Arc::new(db_file));

    println!("1. Category records go to the db file, WARN+ also to the console:");
    let db = registry.logger("db");
    debug!(db, "opening pool with {} connections", 4);
    info!(db, "migrations up to date");
    warn!(db, "query took {} ms", 1250);

    println!("\n2. Unknown categories fall back to the console:");
    let http = registry.logger("http");
    info!(http, "GET /health 200");

    println!("\n3. Lazy messages are only built when emitted:");
    debug!(http, lazy: || format!("headers: {:?}", vec![("accept", "*/*")]));
    debug!(db, lazy: || "expensive dump of the connection pool".to_string());

    println!("\n4. Several threads sharing the registry:");
    let handles: Vec<_> = (0..3)
        .map(|id| {
            let log = registry.logger("db");
            thread::spawn(move || {
                for i in 0..5 {
                    info!(log, "worker {} step {}", id, i);
                }
                error!(log, "worker {} finished with a simulated error", id);
            })
        })
        .collect();
    for handle in handles {
        let _ = handle.join();
    }

    registry.close();

    println!("\n=== Example completed successfully! ===");
    println!("Check 'routing_db.log' for the db category");
    Ok(())
}
