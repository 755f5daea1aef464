//! Category routing: per-category filters and the registry that holds them

use super::{
    dispatch::{Logger, Message},
    log_level::Level,
    record::Record,
    writer::WriterRef,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reserved category holding the default writer
pub const DEFAULT_CATEGORY: &str = "stdout";

/// Threshold and writer bound to one category
#[derive(Clone)]
pub struct Filter {
    pub level: Level,
    pub writer: WriterRef,
    pub category: String,
}

impl Filter {
    pub fn new(category: impl Into<String>, level: Level, writer: WriterRef) -> Self {
        Self {
            level,
            writer,
            category: category.into(),
        }
    }

    #[inline]
    pub fn accepts(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Whether both filters feed the same writer instance
    pub fn shares_writer(&self, other: &Filter) -> bool {
        same_writer(&self.writer, &other.writer)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("category", &self.category)
            .field("level", &self.level)
            .field("writer", &self.writer.name())
            .finish()
    }
}

fn same_writer(a: &WriterRef, b: &WriterRef) -> bool {
    // Compare data pointers only; vtable pointers may differ per codegen unit
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

struct Entries {
    default: Filter,
    categories: HashMap<String, Filter>,
}

/// Category → filter map with a reserved default entry.
///
/// Every accepted record goes to its category's writer and, with mirroring
/// on, also to the default writer when that is a different writer whose own
/// threshold admits the level. Unknown categories fall back to the default
/// writer at `TRACE`.
///
/// # Example
///
/// ```
/// use category_logger::core::{Level, Registry};
/// use category_logger::writers::ConsoleWriter;
/// use std::sync::Arc;
///
/// let console = Arc::new(ConsoleWriter::new().unwrap());
/// let registry = Arc::new(Registry::new(Level::Info, console));
///
/// let log = registry.logger("db");
/// log.info(format_args!("connected in {} ms", 12));
/// registry.close();
/// ```
pub struct Registry {
    entries: RwLock<Entries>,
    mirror: AtomicBool,
}

impl Registry {
    /// Registry whose default entry writes to `writer` at `level`.
    pub fn new(level: Level, writer: WriterRef) -> Self {
        Self {
            entries: RwLock::new(Entries {
                default: Filter::new(DEFAULT_CATEGORY, level, writer),
                categories: HashMap::new(),
            }),
            mirror: AtomicBool::new(true),
        }
    }

    /// Enable or disable copying records to the default writer
    ///
    /// Default: enabled
    #[must_use]
    pub fn with_mirroring(self, enabled: bool) -> Self {
        self.set_mirroring(enabled);
        self
    }

    pub fn set_mirroring(&self, enabled: bool) {
        self.mirror.store(enabled, Ordering::Relaxed);
    }

    pub fn is_mirroring(&self) -> bool {
        self.mirror.load(Ordering::Relaxed)
    }

    /// Insert or replace the filter for `category`.
    ///
    /// Registering [`DEFAULT_CATEGORY`] replaces the default entry.
    pub fn register(&self, category: impl Into<String>, level: Level, writer: WriterRef) {
        let category = category.into();
        let mut entries = self.entries.write();
        if category == DEFAULT_CATEGORY {
            entries.default = Filter::new(category, level, writer);
        } else {
            let filter = Filter::new(category.clone(), level, writer);
            entries.categories.insert(category, filter);
        }
    }

    /// Look up the filter for `category`.
    ///
    /// Never fails and never mutates: an unknown category yields a fresh
    /// filter over the default writer at `TRACE`, named after the request.
    pub fn resolve(&self, category: &str) -> Filter {
        let entries = self.entries.read();
        if category == DEFAULT_CATEGORY {
            return entries.default.clone();
        }
        match entries.categories.get(category) {
            Some(filter) => filter.clone(),
            None => Filter::new(category, Level::Trace, Arc::clone(&entries.default.writer)),
        }
    }

    pub fn default_filter(&self) -> Filter {
        self.entries.read().default.clone()
    }

    pub fn contains(&self, category: &str) -> bool {
        category == DEFAULT_CATEGORY || self.entries.read().categories.contains_key(category)
    }

    /// Registered category names, excluding the default entry
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().categories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Handle bound to `category` for the leveled logging calls
    pub fn logger(self: &Arc<Self>, category: impl Into<String>) -> Logger {
        Logger::new(Arc::clone(self), category)
    }

    /// Whether a record at `level` in `category` would reach any writer
    pub fn enabled(&self, level: Level, category: &str) -> bool {
        let (primary, mirror) = self.targets(level, category);
        primary.is_some() || mirror.is_some()
    }

    /// Route one log call.
    ///
    /// `source` and `message` are only evaluated once at least one writer
    /// will take the record.
    pub fn dispatch<F>(&self, level: Level, category: &str, source: F, message: Message<'_>)
    where
        F: FnOnce() -> String,
    {
        let (primary, mirror) = self.targets(level, category);
        if primary.is_none() && mirror.is_none() {
            return;
        }

        let record = Arc::new(Record::new(level, category, source(), message.render()));
        if let Some(writer) = primary {
            writer.log_write(Arc::clone(&record));
        }
        if let Some(writer) = mirror {
            writer.log_write(record);
        }
    }

    /// Writers that accept `level` for `category`: the category's own writer
    /// and, once that filter admits the record, the mirrored default writer.
    fn targets(&self, level: Level, category: &str) -> (Option<WriterRef>, Option<WriterRef>) {
        let entries = self.entries.read();
        let default = &entries.default;
        let filter = if category == DEFAULT_CATEGORY {
            Some(default)
        } else {
            entries.categories.get(category)
        };

        let (threshold, writer) = match filter {
            Some(filter) => (filter.level, &filter.writer),
            None => (Level::Trace, &default.writer),
        };

        // The category's own threshold gates the mirror too
        if level < threshold {
            return (None, None);
        }

        let primary = Some(Arc::clone(writer));
        let mirror = (self.is_mirroring()
            && !same_writer(writer, &default.writer)
            && default.accepts(level))
        .then(|| Arc::clone(&default.writer));

        (primary, mirror)
    }

    /// Close every distinct writer once. Safe to call repeatedly.
    pub fn close(&self) {
        let writers: Vec<WriterRef> = {
            let entries = self.entries.read();
            let mut unique: Vec<WriterRef> = Vec::new();
            for writer in std::iter::once(&entries.default.writer)
                .chain(entries.categories.values().map(|f| &f.writer))
            {
                if !unique.iter().any(|seen| same_writer(seen, writer)) {
                    unique.push(Arc::clone(writer));
                }
            }
            unique
        };

        // Closing joins worker threads; do it outside the lock
        for writer in writers {
            writer.close();
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_struct("Registry")
            .field("default", &entries.default)
            .field("categories", &entries.categories.len())
            .field("mirror", &self.is_mirroring())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::{LogWriter, WriterMetrics};
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Synchronous writer that keeps what it receives
    #[derive(Default)]
    pub(crate) struct CaptureWriter {
        pub(crate) records: Mutex<Vec<Arc<Record>>>,
        pub(crate) closes: AtomicUsize,
        metrics: WriterMetrics,
    }

    impl CaptureWriter {
        pub(crate) fn messages(&self) -> Vec<String> {
            self.records
                .lock()
                .iter()
                .map(|r| r.message.clone())
                .collect()
        }
    }

    impl LogWriter for CaptureWriter {
        fn log_write(&self, record: Arc<Record>) {
            self.metrics.record_written(record.message.len() as u64);
            self.records.lock().push(record);
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "capture"
        }

        fn metrics(&self) -> &WriterMetrics {
            &self.metrics
        }
    }

    fn setup(default_level: Level) -> (Registry, Arc<CaptureWriter>, Arc<CaptureWriter>) {
        let default = Arc::new(CaptureWriter::default());
        let db = Arc::new(CaptureWriter::default());
        let registry = Registry::new(default_level, default.clone());
        registry.register("db", Level::Debug, db.clone());
        (registry, default, db)
    }

    fn send(registry: &Registry, level: Level, category: &str, msg: &str) {
        registry.dispatch(level, category, || "test.rs:1".to_string(), Message::Text(msg));
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let (registry, default, db) = setup(Level::Info);

        let filter = registry.resolve("db");
        assert_eq!(filter.level, Level::Debug);
        assert_eq!(filter.category, "db");
        assert!(same_writer(&filter.writer, &(db as WriterRef)));

        let unknown = registry.resolve("cache");
        assert_eq!(unknown.level, Level::Trace);
        assert_eq!(unknown.category, "cache");
        assert!(same_writer(&unknown.writer, &(default as WriterRef)));

        // The fallback is transient
        assert!(!registry.contains("cache"));
        assert_eq!(registry.default_filter().category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_register_is_upsert() {
        let (registry, _default, _db) = setup(Level::Info);
        let other = Arc::new(CaptureWriter::default());
        registry.register("db", Level::Error, other.clone());

        assert_eq!(registry.categories(), vec!["db".to_string()]);
        let filter = registry.resolve("db");
        assert_eq!(filter.level, Level::Error);
        assert!(same_writer(&filter.writer, &(other as WriterRef)));
    }

    #[test]
    fn test_register_default_replaces_fallback() {
        let (registry, _default, _db) = setup(Level::Info);
        let replacement = Arc::new(CaptureWriter::default());
        registry.register(DEFAULT_CATEGORY, Level::Warn, replacement.clone());

        send(&registry, Level::Warn, "unknown", "hello");
        assert_eq!(replacement.messages(), vec!["hello"]);
        assert_eq!(registry.default_filter().level, Level::Warn);
    }

    #[test]
    fn test_category_record_is_mirrored_to_default() {
        let (registry, default, db) = setup(Level::Info);

        send(&registry, Level::Info, "db", "query done");
        assert_eq!(db.messages(), vec!["query done"]);
        assert_eq!(default.messages(), vec!["query done"]);

        // Both queues share one record
        let a = db.records.lock()[0].clone();
        let b = default.records.lock()[0].clone();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.category, "db");
    }

    #[test]
    fn test_mirror_respects_default_threshold() {
        let (registry, default, db) = setup(Level::Warn);

        send(&registry, Level::Debug, "db", "detail");
        assert_eq!(db.messages(), vec!["detail"]);
        assert!(default.messages().is_empty());
    }

    #[test]
    fn test_category_threshold_gates_mirror() {
        let default = Arc::new(CaptureWriter::default());
        let db = Arc::new(CaptureWriter::default());
        let registry = Registry::new(Level::Trace, default.clone());
        registry.register("db", Level::Error, db.clone());

        let calls = AtomicUsize::new(0);
        let producer = || {
            calls.fetch_add(1, Ordering::SeqCst);
            "hidden".to_string()
        };
        registry.dispatch(Level::Info, "db", || "x".to_string(), Message::Lazy(&producer));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(db.messages().is_empty());
        assert!(default.messages().is_empty());
        assert!(!registry.enabled(Level::Info, "db"));

        send(&registry, Level::Error, "db", "shown");
        assert_eq!(db.messages(), vec!["shown"]);
        assert_eq!(default.messages(), vec!["shown"]);
    }

    #[test]
    fn test_mirroring_disabled() {
        let (registry, default, db) = setup(Level::Trace);
        let registry = registry.with_mirroring(false);

        send(&registry, Level::Error, "db", "only db");
        assert_eq!(db.messages(), vec!["only db"]);
        assert!(default.messages().is_empty());
    }

    #[test]
    fn test_unknown_category_goes_to_default_once() {
        let (registry, default, db) = setup(Level::Error);

        send(&registry, Level::Trace, "cache", "miss");
        assert_eq!(default.messages(), vec!["miss"]);
        assert!(db.messages().is_empty());
        assert_eq!(default.records.lock()[0].category, "cache");
    }

    #[test]
    fn test_rejected_level_skips_rendering() {
        let (registry, default, db) = setup(Level::Error);
        let calls = AtomicUsize::new(0);
        let producer = || {
            calls.fetch_add(1, Ordering::SeqCst);
            "expensive".to_string()
        };

        registry.dispatch(Level::Trace, "db", || "x".to_string(), Message::Lazy(&producer));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(db.messages().is_empty());
        assert!(default.messages().is_empty());
        assert!(!registry.enabled(Level::Trace, "db"));
        assert!(registry.enabled(Level::Debug, "db"));
    }

    #[test]
    fn test_close_closes_each_writer_once() {
        let default = Arc::new(CaptureWriter::default());
        let shared = Arc::new(CaptureWriter::default());
        let registry = Registry::new(Level::Info, default.clone());
        registry.register("a", Level::Info, shared.clone());
        registry.register("b", Level::Info, shared.clone());
        registry.register("c", Level::Info, default.clone());

        registry.close();
        assert_eq!(default.closes.load(Ordering::SeqCst), 1);
        assert_eq!(shared.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filter_debug_names_writer() {
        let (registry, _default, _db) = setup(Level::Info);
        let rendered = format!("{:?}", registry.resolve("db"));
        assert!(rendered.contains("capture"));
        assert!(rendered.contains("Debug"));
    }
}
