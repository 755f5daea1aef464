//! # Category Logger
//!
//! A category-routed logging runtime: every log call names a category, each
//! category has a threshold and one writer, and accepted records travel
//! through a bounded queue to a dedicated worker thread per writer.
//!
//! ## Features
//!
//! - **Fast rejection**: below-threshold calls return before any formatting
//! - **Writers**: console, rotating file (lines, bytes, daily) and TCP/UDP
//! - **Backpressure**: full queues block the caller instead of dropping records
//! - **Isolation**: a panicking writer stops alone; callers and siblings carry on
//!
//! ## Example
//!
//! ```no_run
//! use category_logger::prelude::*;
//! use category_logger::{info, warn};
//! use std::sync::Arc;
//!
//! let console = Arc::new(ConsoleWriter::new().unwrap());
//! let registry = Arc::new(Registry::new(Level::Info, console));
//!
//! let db_file = FileWriter::builder("logs/db.log")
//!     .max_bytes(10 * 1024 * 1024)
//!     .keep_history(true)
//!     .build()
//!     .unwrap();
//! registry.register("db", Level::Debug, Arc::new(db_file));
//!
//! let db = registry.logger("db");
//! info!(db, "pool ready with {} connections", 8);
//! warn!(db, "slow query took {} ms", 1200);
//!
//! registry.close();
//! ```

pub mod config;
pub mod core;
pub mod macros;
pub mod writers;

pub mod prelude {
    pub use crate::config::LogConfig;
    pub use crate::core::{
        Filter, Level, LogWriter, Logger, LoggerError, Message, Record, Registry, Result,
        WriterMetrics, DEFAULT_CATEGORY,
    };
    pub use crate::writers::{ConnectionWriter, ConsoleWriter, FileWriter, Protocol, RotationPolicy};
}

pub use config::{parse_size, ConsoleConfig, FileConfig, LogConfig, SizeValue, SocketConfig};
pub use core::{
    Filter, Level, LogWriter, Logger, LoggerError, Message, Pattern, Record, Registry, Result,
    WriterMetrics, WriterRef, DEFAULT_BUFFER_LENGTH, DEFAULT_CATEGORY, DEFAULT_PATTERN,
};
pub use writers::{ConnectionWriter, ConsoleWriter, FileWriter, Protocol, RotationPolicy};
