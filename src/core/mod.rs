//! Core logger types and traits

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod log_level;
pub mod metrics;
pub mod pattern;
pub mod record;
pub mod supervisor;
pub mod worker;
pub mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{Logger, Message};
pub use error::{LoggerError, Result};
pub use filter::{Filter, Registry, DEFAULT_CATEGORY};
pub use log_level::Level;
pub use metrics::WriterMetrics;
pub use pattern::{Pattern, DEFAULT_PATTERN, XML_HEADER, XML_RECORD_PATTERN, XML_TRAILER};
pub use record::{source_of, Record};
pub use supervisor::{supervise, Outcome};
pub use worker::{Control, Worker, DEFAULT_BUFFER_LENGTH};
pub use writer::{LogWriter, Sink, WriterRef};
