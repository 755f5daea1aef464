//! Writer traits for log output destinations

use super::{error::Result, metrics::WriterMetrics, record::Record};
use std::sync::Arc;

/// Handle through which the dispatch layer reaches a backend.
///
/// `log_write` only enqueues; it blocks the caller when the backend's bounded
/// queue is full and never reports sink failures back to the caller.
pub trait LogWriter: Send + Sync {
    fn log_write(&self, record: Arc<Record>);

    /// Flush and release the sink. Calling it again is a no-op.
    fn close(&self);

    fn name(&self) -> &str;

    fn metrics(&self) -> &WriterMetrics;
}

pub type WriterRef = Arc<dyn LogWriter>;

/// The output side of a writer, owned and driven by exactly one worker thread.
///
/// Returning an error from `write` or `rotate` stops the worker.
pub trait Sink: Send + 'static {
    fn write(&mut self, record: &Record) -> Result<()>;

    /// Handle an explicit rotation request.
    fn rotate(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()>;

    /// Release the sink. Runs once on every worker exit path, panics included.
    fn close(&mut self);

    fn name(&self) -> &str;
}
