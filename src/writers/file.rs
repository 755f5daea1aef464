//! Rotating file writer
//!
//! One worker thread owns the open file. Before every write it checks the
//! rotation thresholds (line count, byte size, calendar day); any one of them
//! firing closes the current file, archives it and opens a fresh one before
//! the record is appended.
//!
//! Archived names:
//!
//! - day change: `app.log.2024-03-09` (the day the file was opened)
//! - line/size limit or explicit request: `app.log.1` is always the newest,
//!   older ones shift up to `app.log.<max_backup>`; the oldest is overwritten
//!   once the chain is full.

use crate::core::{
    Clock, Control, LogWriter, LoggerError, Pattern, Record, Result, Sink, SystemClock, Worker,
    WriterMetrics, DEFAULT_BUFFER_LENGTH, XML_HEADER, XML_RECORD_PATTERN, XML_TRAILER,
};
use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default number of numbered backups kept
pub const DEFAULT_MAX_BACKUP: usize = 999;

/// When and how a file writer rotates
///
/// # Examples
///
/// ```
/// use category_logger::writers::RotationPolicy;
///
/// // Keep ten numbered backups of at most 10 MiB each
/// let policy = RotationPolicy::new()
///     .with_max_bytes(10 * 1024 * 1024)
///     .with_max_backup(10)
///     .with_keep_history(true);
///
/// // One file per day
/// let policy = RotationPolicy::new().with_daily(true).with_keep_history(true);
/// assert!(policy.is_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate after this many lines; 0 disables
    pub max_lines: u64,
    /// Rotate once the file reaches this many bytes; 0 disables
    pub max_bytes: u64,
    /// Rotate when the calendar day changes
    pub daily: bool,
    /// Archive rotated files instead of continuing to append to the same one
    pub keep_history: bool,
    /// Highest numbered backup kept
    pub max_backup: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_lines: 0,
            max_bytes: 0,
            daily: false,
            keep_history: false,
            max_backup: DEFAULT_MAX_BACKUP,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_lines(mut self, max_lines: u64) -> Self {
        self.max_lines = max_lines;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_daily(mut self, daily: bool) -> Self {
        self.daily = daily;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_keep_history(mut self, keep_history: bool) -> Self {
        self.keep_history = keep_history;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backup(mut self, max_backup: usize) -> Self {
        self.max_backup = max_backup;
        self
    }

    /// Whether any automatic trigger is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.max_lines > 0 || self.max_bytes > 0 || self.daily
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    DayChanged,
    Limit,
    Requested,
}

pub(crate) struct FileSink {
    path: PathBuf,
    name: String,
    writer: Option<BufWriter<File>>,
    pattern: Pattern,
    header: Pattern,
    trailer: Pattern,
    policy: RotationPolicy,
    sanitize: bool,
    current_lines: u64,
    current_bytes: u64,
    open_day: NaiveDate,
    clock: Arc<dyn Clock>,
    metrics: Arc<WriterMetrics>,
}

impl FileSink {
    fn open(builder: FileWriterBuilder, metrics: Arc<WriterMetrics>) -> Result<Self> {
        let path = builder.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let today = builder.clock.today();
        let mut sink = Self {
            name: format!("file:{}", path.display()),
            path,
            writer: None,
            pattern: builder.pattern,
            header: builder.header,
            trailer: builder.trailer,
            policy: builder.policy,
            sanitize: builder.sanitize,
            current_lines: 0,
            current_bytes: 0,
            open_day: today,
            clock: builder.clock,
            metrics,
        };

        if sink.policy.keep_history {
            sink.archive_existing(today)?;
        }
        let existing = sink.open_file()?;
        sink.current_bytes = existing;
        sink.metrics.reset_file_gauges(existing);
        Ok(sink)
    }

    /// Move a leftover file from a previous run out of the way.
    fn archive_existing(&mut self, today: NaiveDate) -> Result<()> {
        let Ok(metadata) = fs::metadata(&self.path) else {
            return Ok(());
        };
        if metadata.len() == 0 {
            return Ok(());
        }

        if self.policy.daily {
            let modified: DateTime<Local> = metadata
                .modified()
                .map(DateTime::from)
                .unwrap_or_else(|_| self.clock.now());
            let modified_day = modified.date_naive();
            if modified_day != today {
                self.archive_dated(modified_day)?;
            }
            Ok(())
        } else {
            self.archive_numbered()
        }
    }

    /// Open the base file in append mode and write the header.
    ///
    /// Returns the file length before the header was written.
    fn open_file(&mut self) -> Result<u64> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_writer(
                    self.path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;
        let existing = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_writer(
                    self.path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        let mut writer = BufWriter::new(file);
        if !self.header.is_empty() {
            let header = self.header.render(&Record::stamp(self.clock.now()));
            writeln!(writer, "{}", header).map_err(|e| {
                LoggerError::file_writer(
                    self.path.display().to_string(),
                    format!("Failed to write header: {}", e),
                )
            })?;
        }
        self.writer = Some(writer);
        Ok(existing)
    }

    /// Write the trailer and release the file, if one is open.
    fn close_file(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        if !self.trailer.is_empty() {
            let trailer = self.trailer.render(&Record::stamp(self.clock.now()));
            writeln!(writer, "{}", trailer)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn rotation_due(&self, today: NaiveDate) -> Option<Trigger> {
        if self.policy.daily && today != self.open_day {
            return Some(Trigger::DayChanged);
        }
        let lines_reached = self.policy.max_lines > 0 && self.current_lines >= self.policy.max_lines;
        let bytes_reached = self.policy.max_bytes > 0 && self.current_bytes >= self.policy.max_bytes;
        if lines_reached || bytes_reached {
            Some(Trigger::Limit)
        } else {
            None
        }
    }

    fn rotate_now(&mut self, trigger: Trigger, today: NaiveDate) -> Result<()> {
        self.close_file().map_err(|e| {
            LoggerError::file_rotation(
                self.path.display().to_string(),
                format!("Failed to close current file: {}", e),
            )
        })?;

        if self.policy.keep_history && self.path.exists() {
            match trigger {
                Trigger::DayChanged => self.archive_dated(self.open_day)?,
                // Daily files that hit a size or line limit mid-day still
                // get numbered backups instead of growing past the limit
                Trigger::Limit | Trigger::Requested => self.archive_numbered()?,
            }
        }

        self.open_file().map_err(|e| {
            LoggerError::file_rotation(
                self.path.display().to_string(),
                format!("Failed to create new log file: {}", e),
            )
        })?;
        self.current_lines = 0;
        self.current_bytes = 0;
        self.open_day = today;
        self.metrics.record_rotation();
        Ok(())
    }

    /// Shift `.1 .. .(max-1)` up by one, then move the live file to `.1`.
    fn archive_numbered(&self) -> Result<()> {
        let max_backup = self.policy.max_backup.max(1);
        for n in (2..=max_backup).rev() {
            let from = self.backup_path(&(n - 1).to_string());
            if from.exists() {
                let to = self.backup_path(&n.to_string());
                rename_replacing(&from, &to)?;
            }
        }
        rename_replacing(&self.path, &self.backup_path("1"))
    }

    /// Move the live file to `<name>.<day>`, or the first free `<name>.<day>.N`.
    fn archive_dated(&self, day: NaiveDate) -> Result<()> {
        let stamp = day.format("%Y-%m-%d").to_string();
        let mut target = self.backup_path(&stamp);
        if target.exists() {
            let free = (1..=self.policy.max_backup.max(1))
                .map(|n| self.backup_path(&format!("{}.{}", stamp, n)))
                .find(|candidate| !candidate.exists());
            match free {
                Some(candidate) => target = candidate,
                None => eprintln!(
                    "[LOGGER WARNING] No free backup name for {}, overwriting {}",
                    self.path.display(),
                    target.display()
                ),
            }
        }
        rename_replacing(&self.path, &target)
    }

    fn backup_path(&self, suffix: &str) -> PathBuf {
        let mut path = self.path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log")
            .to_string();
        path.set_file_name(format!("{}.{}", filename, suffix));
        path
    }

    fn render(&self, record: &Record) -> String {
        let mut line = if self.sanitize {
            self.pattern
                .render_with_message(record, &record.sanitized_message())
        } else {
            self.pattern.render(record)
        };
        line.push('\n');
        line
    }

    #[cfg(test)]
    fn current_lines(&self) -> u64 {
        self.current_lines
    }

    #[cfg(test)]
    fn current_bytes(&self) -> u64 {
        self.current_bytes
    }
}

fn rename_replacing(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            // Some platforms refuse to rename onto an existing file
            if to.exists() {
                let _ = fs::remove_file(to);
            }
            fs::rename(from, to).map_err(|e| {
                LoggerError::file_rotation(
                    from.display().to_string(),
                    format!("Failed to rename to '{}': {}", to.display(), e),
                )
            })
        }
    }
}

impl Sink for FileSink {
    fn write(&mut self, record: &Record) -> Result<()> {
        let today = self.clock.today();
        if let Some(trigger) = self.rotation_due(today) {
            self.rotate_now(trigger, today)?;
        }

        let line = self.render(record);
        let Some(writer) = self.writer.as_mut() else {
            self.metrics.record_failed();
            return Err(LoggerError::writer("File writer not initialized"));
        };
        if let Err(e) = writer.write_all(line.as_bytes()) {
            self.metrics.record_failed();
            return Err(LoggerError::file_writer(
                self.path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            ));
        }

        let bytes = line.len() as u64;
        self.current_lines += 1;
        self.current_bytes += bytes;
        self.metrics.record_written(bytes);
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        let today = self.clock.today();
        let trigger = if self.policy.daily && today != self.open_day {
            Trigger::DayChanged
        } else {
            Trigger::Requested
        };
        self.rotate_now(trigger, today)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_writer(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Err(e) = self.close_file() {
            eprintln!(
                "[LOGGER ERROR] Failed to close {}: {}",
                self.path.display(),
                e
            );
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.close();
    }
}

/// File writer with optional rotation
///
/// # Examples
///
/// ```no_run
/// use category_logger::writers::{FileWriter, RotationPolicy};
///
/// // Plain append-only file
/// let writer = FileWriter::new("/var/log/app.log").unwrap();
///
/// // 10 000 lines per file, keep the last 5
/// let writer = FileWriter::builder("/var/log/app.log")
///     .pattern("[%D %T] [%C] [%L] (%S) %M")
///     .rotation(
///         RotationPolicy::new()
///             .with_max_lines(10_000)
///             .with_max_backup(5)
///             .with_keep_history(true),
///     )
///     .sanitize(true)
///     .build()
///     .unwrap();
/// ```
pub struct FileWriter {
    worker: Worker,
    path: PathBuf,
}

impl FileWriter {
    /// Append-only file writer with the default pattern
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or opened
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(path).build()
    }

    #[must_use]
    pub fn builder(path: impl Into<PathBuf>) -> FileWriterBuilder {
        FileWriterBuilder::new(path)
    }

    /// Ask the worker to rotate before the next record.
    pub fn rotate(&self) {
        self.worker.request(Control::Rotate);
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogWriter for FileWriter {
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

pub struct FileWriterBuilder {
    path: PathBuf,
    pattern: Pattern,
    header: Pattern,
    trailer: Pattern,
    policy: RotationPolicy,
    sanitize: bool,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl FileWriterBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pattern: Pattern::default(),
            header: Pattern::new(""),
            trailer: Pattern::new(""),
            policy: RotationPolicy::default(),
            sanitize: false,
            capacity: DEFAULT_BUFFER_LENGTH,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Header written whenever a file is opened, trailer whenever one is
    /// closed. Both accept the same directives as the line pattern.
    #[must_use = "builder methods return a new value"]
    pub fn header_footer(mut self, header: impl Into<Pattern>, trailer: impl Into<Pattern>) -> Self {
        self.header = header.into();
        self.trailer = trailer.into();
        self
    }

    /// XML record blocks wrapped in a `<log>` element
    #[must_use = "builder methods return a new value"]
    pub fn xml(self) -> Self {
        self.pattern(XML_RECORD_PATTERN)
            .header_footer(XML_HEADER, XML_TRAILER)
    }

    #[must_use = "builder methods return a new value"]
    pub fn rotation(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_lines(mut self, max_lines: u64) -> Self {
        self.policy.max_lines = max_lines;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.policy.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn daily(mut self, daily: bool) -> Self {
        self.policy.daily = daily;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn keep_history(mut self, keep_history: bool) -> Self {
        self.policy.keep_history = keep_history;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_backup(mut self, max_backup: usize) -> Self {
        self.policy.max_backup = max_backup;
        self
    }

    /// Escape newlines in messages to block log injection
    #[must_use = "builder methods return a new value"]
    pub fn sanitize(mut self, sanitize: bool) -> Self {
        self.sanitize = sanitize;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Open the file and start the worker.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created, or a leftover
    /// file cannot be archived
    pub fn build(self) -> Result<FileWriter> {
        let path = self.path.clone();
        let capacity = self.capacity;
        let metrics = Arc::new(WriterMetrics::new());
        let sink = FileSink::open(self, Arc::clone(&metrics))?;
        Ok(FileWriter {
            worker: Worker::spawn(sink, capacity, metrics)?,
            path,
        })
    }

    #[cfg(test)]
    pub(crate) fn open_sink(self) -> Result<FileSink> {
        FileSink::open(self, Arc::new(WriterMetrics::new()))
    }
}
