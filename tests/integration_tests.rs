//! Integration tests for the category logger
//!
//! These tests verify:
//! - Category routing and mirroring to the default writer
//! - File rotation driven through the public writers
//! - Log injection prevention
//! - Configuration-driven setup
//! - Panic isolation between writers

use category_logger::core::{Sink, Worker};
use category_logger::prelude::*;
use category_logger::{debug, error, info, trace, Pattern};
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Stdout stand-in for the console writer
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn console(buffer: &SharedBuffer, pattern: &str) -> Arc<ConsoleWriter> {
    Arc::new(
        ConsoleWriter::builder()
            .pattern(pattern)
            .output(Box::new(buffer.clone()))
            .build()
            .expect("Failed to create console writer"),
    )
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_category_file_and_console_mirror() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("db.log");
    let stdout = SharedBuffer::default();

    let registry = Arc::new(Registry::new(Level::Warn, console(&stdout, "%C %L %M")));
    let file = FileWriter::builder(&log_file)
        .pattern("%C %L %M")
        .build()
        .expect("Failed to create file writer");
    registry.register("db", Level::Debug, Arc::new(file));

    let db = registry.logger("db");
    trace!(db, "not recorded");
    debug!(db, "query plan cached");
    error!(db, "deadlock detected");
    registry.close();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content, "db DEBUG query plan cached\ndb ERROR deadlock detected\n");
    // Only the record at or above the console threshold is mirrored
    assert_eq!(stdout.contents(), "db ERROR deadlock detected\n");
}

#[test]
fn test_unknown_category_reaches_default_writer() {
    let stdout = SharedBuffer::default();
    let registry = Arc::new(Registry::new(Level::Error, console(&stdout, "%C|%L|%M")));

    let cache = registry.logger("cache");
    trace!(cache, "fallback is permissive");
    registry.close();

    assert_eq!(stdout.contents(), "cache|TRACE|fallback is permissive\n");
}

#[test]
fn test_default_category_written_once() {
    let stdout = SharedBuffer::default();
    let registry = Arc::new(Registry::new(Level::Info, console(&stdout, "%M")));

    let root = registry.logger(DEFAULT_CATEGORY);
    info!(root, "once");
    registry.close();

    assert_eq!(stdout.contents(), "once\n");
}

#[test]
fn test_log_injection_prevention() {
    // Newlines are escaped so a message cannot forge extra entries
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("injection_test.log");
    let stdout = SharedBuffer::default();

    let registry = Arc::new(Registry::new(Level::Fatal, console(&stdout, "%M")));
    let file = FileWriter::builder(&log_file)
        .sanitize(true)
        .build()
        .expect("Failed to create file writer");
    registry.register("auth", Level::Info, Arc::new(file));

    let malicious_message = "User login\n[2024/10/17 10:00:00] [ERROR] (x) Fake error injected\r\nINFO Continuation";
    registry.logger("auth").info(malicious_message);
    registry.close();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("\\n"));
    assert!(content.contains("\\r"));
    assert!(!content.contains("\n[2024/10/17 10:00:00] [ERROR]"));

    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1, "Log should be a single line, not multiple");
    assert!(lines[0].contains("[INFO]"));
}

#[test]
fn test_size_rotation_end_to_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("sized.log");

    let writer = Arc::new(
        FileWriter::builder(&log_file)
            .pattern("%M")
            .max_bytes(category_logger::parse_size("1K", 1024).expect("valid size"))
            .keep_history(true)
            .build()
            .expect("Failed to create file writer"),
    );
    let registry = Arc::new(Registry::new(Level::Trace, writer.clone()));
    let log = registry.logger(DEFAULT_CATEGORY);

    // 63 characters + newline = 64 bytes, 16 lines fill 1 KiB exactly
    let line = "y".repeat(63);
    for _ in 0..17 {
        log.info(line.as_str());
    }
    registry.close();

    assert_eq!(writer.metrics().rotation_count(), 1);
    assert_eq!(writer.metrics().current_bytes(), 64);
    let backup = temp_dir.path().join("sized.log.1");
    assert_eq!(fs::metadata(&backup).expect("backup exists").len(), 1024);
    assert_eq!(fs::metadata(&log_file).expect("live file exists").len(), 64);
}

#[test]
fn test_explicit_rotation_keeps_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("manual.log");

    let writer = Arc::new(
        FileWriter::builder(&log_file)
            .pattern("%M")
            .header_footer("-- open --", "-- close --")
            .keep_history(true)
            .max_backup(3)
            .build()
            .expect("Failed to create file writer"),
    );

    for round in 0..3 {
        writer.log_write(Arc::new(Record::new(
            Level::Info,
            "manual",
            "it.rs:1",
            format!("round {}", round),
        )));
        let written = round + 1;
        assert!(wait_for(|| writer.metrics().written_count() == written));
        writer.rotate();
        assert!(wait_for(|| writer.metrics().rotation_count() == written));
    }
    writer.close();

    for (suffix, round) in [(1, 2), (2, 1), (3, 0)] {
        let backup = temp_dir.path().join(format!("manual.log.{}", suffix));
        let content = fs::read_to_string(&backup).expect("Failed to read backup");
        assert_eq!(content, format!("-- open --\nround {}\n-- close --\n", round));
    }
    assert_eq!(
        fs::read_to_string(&log_file).expect("Failed to read log file"),
        "-- open --\n-- close --\n"
    );
}

#[test]
fn test_config_driven_setup() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let lines_file = temp_dir.path().join("lines.log");
    let config_path = temp_dir.path().join("logging.json");

    let json = serde_json::json!({
        "console": { "enable": false },
        "files": [{
            "enable": true,
            "category": "jobs",
            "level": "INFO",
            "filename": lines_file,
            "pattern": "%L %M",
            "rotate": true,
            "maxLines": "2",
            "maxbackup": 2
        }],
        "bufferLength": 4
    });
    fs::write(&config_path, json.to_string()).expect("Failed to write config");

    let config = LogConfig::from_file(&config_path).expect("Failed to load config");
    let registry = Arc::new(Registry::from_config(&config).expect("Failed to build registry"));
    let jobs = registry.logger("jobs");
    for i in 0..5 {
        info!(jobs, "job {}", i);
    }
    registry.close();

    let read = |name: &str| {
        fs::read_to_string(temp_dir.path().join(name)).expect("Failed to read log file")
    };
    assert_eq!(read("lines.log.2"), "INFO job 0\nINFO job 1\n");
    assert_eq!(read("lines.log.1"), "INFO job 2\nINFO job 3\n");
    assert_eq!(read("lines.log"), "INFO job 4\n");
}

/// Sink that panics on a poisoned message
struct FragileSink {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Sink for FragileSink {
    fn write(&mut self, record: &Record) -> Result<()> {
        if record.message == "poison" {
            panic!("fragile sink hit poison");
        }
        self.seen.lock().push(record.message.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {}

    fn name(&self) -> &str {
        "fragile"
    }
}

struct FragileWriter {
    worker: Worker,
}

impl LogWriter for FragileWriter {
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

#[test]
fn test_panicking_writer_is_isolated() {
    let stdout = SharedBuffer::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let fragile = Arc::new(FragileWriter {
        worker: Worker::spawn(
            FragileSink { seen: seen.clone() },
            8,
            Arc::new(WriterMetrics::new()),
        )
        .expect("Failed to spawn worker"),
    });

    let registry = Arc::new(Registry::new(Level::Info, console(&stdout, "%M")));
    registry.register("fragile", Level::Info, fragile.clone());
    let log = registry.logger("fragile");

    log.info("before");
    log.info("poison");
    assert!(wait_for(|| !fragile.metrics().is_alive()));
    assert_eq!(fragile.metrics().panic_count(), 1);

    // The caller and the console writer keep working
    log.info("after");
    registry.logger("other").info("unaffected");
    registry.close();

    assert_eq!(*seen.lock(), vec!["before".to_string()]);
    assert_eq!(stdout.contents(), "before\npoison\nafter\nunaffected\n");
}

#[test]
fn test_pattern_round_trip_default() {
    let record = Record::new(Level::Warn, "app", "main.rs:12", "disk almost full");
    let line = Pattern::default().render(&record);

    assert!(line.contains("[WARN]"));
    assert!(line.contains("(main.rs:12)"));
    assert!(line.ends_with("disk almost full"));
    assert!(!line.contains('%'));
}
