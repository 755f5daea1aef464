//! Console writer implementation

use crate::core::{
    Level, LogWriter, Pattern, Record, Result, Sink, Worker, WriterMetrics, DEFAULT_BUFFER_LENGTH,
};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;

struct ConsoleSink {
    out: Box<dyn Write + Send>,
    pattern: Pattern,
    use_colors: bool,
    metrics: Arc<WriterMetrics>,
}

impl ConsoleSink {
    fn format_line(&self, record: &Record) -> String {
        paint(self.pattern.render(record), record.level, self.use_colors)
    }
}

#[cfg(feature = "console")]
fn paint(line: String, level: Level, use_colors: bool) -> String {
    if use_colors {
        line.color(level.color_code()).to_string()
    } else {
        line
    }
}

#[cfg(not(feature = "console"))]
fn paint(line: String, _level: Level, _use_colors: bool) -> String {
    line
}

impl Sink for ConsoleSink {
    fn write(&mut self, record: &Record) -> Result<()> {
        let mut line = self.format_line(record);
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        self.metrics.record_written(line.len() as u64);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.out.flush();
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Writes rendered records to standard output from a background worker.
///
/// # Example
///
/// ```
/// use category_logger::writers::ConsoleWriter;
/// use category_logger::LogWriter;
///
/// let writer = ConsoleWriter::builder()
///     .pattern("[%L] %M")
///     .colors(false)
///     .build()
///     .unwrap();
/// writer.close();
/// ```
pub struct ConsoleWriter {
    worker: Worker,
}

impl ConsoleWriter {
    /// Console writer with the default pattern
    ///
    /// # Errors
    ///
    /// Returns error if the worker thread cannot be started
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> ConsoleWriterBuilder {
        ConsoleWriterBuilder::new()
    }
}

impl LogWriter for ConsoleWriter {
    fn log_write(&self, record: Arc<Record>) {
        self.worker.push(record);
    }

    fn close(&self) {
        self.worker.close();
    }

    fn name(&self) -> &str {
        self.worker.name()
    }

    fn metrics(&self) -> &WriterMetrics {
        self.worker.metrics()
    }
}

pub struct ConsoleWriterBuilder {
    pattern: Pattern,
    use_colors: bool,
    capacity: usize,
    out: Option<Box<dyn Write + Send>>,
}

impl ConsoleWriterBuilder {
    pub fn new() -> Self {
        Self {
            pattern: Pattern::default(),
            use_colors: false,
            capacity: DEFAULT_BUFFER_LENGTH,
            out: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Color whole lines by level. Ignored without the `console` feature.
    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Queue capacity; callers block once this many records are pending
    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Write somewhere other than stdout
    #[must_use = "builder methods return a new value"]
    pub fn output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = Some(out);
        self
    }

    /// # Errors
    ///
    /// Returns error if the worker thread cannot be started
    pub fn build(self) -> Result<ConsoleWriter> {
        let metrics = Arc::new(WriterMetrics::new());
        let sink = ConsoleSink {
            out: self.out.unwrap_or_else(|| Box::new(std::io::stdout())),
            pattern: self.pattern,
            use_colors: self.use_colors,
            metrics: Arc::clone(&metrics),
        };
        Ok(ConsoleWriter {
            worker: Worker::spawn(sink, self.capacity, metrics)?,
        })
    }
}

impl Default for ConsoleWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
