//! Writer implementations

pub mod connection;
pub mod console;
pub mod file;

pub use connection::{ConnectionWriter, ConnectionWriterBuilder, Protocol};
pub use console::{ConsoleWriter, ConsoleWriterBuilder};
pub use file::{FileWriter, FileWriterBuilder, RotationPolicy, DEFAULT_MAX_BACKUP};

pub use crate::core::LogWriter;
