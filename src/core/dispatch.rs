//! Leveled logging entry points

use super::{filter::Registry, log_level::Level, record::source_of};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// The payload of a log call, rendered only once a writer will take it.
#[derive(Clone, Copy)]
pub enum Message<'a> {
    /// `format_args!` output
    Format(fmt::Arguments<'a>),
    /// Plain text, used as-is
    Text(&'a str),
    /// Producer called at most once, and only if the record is emitted
    Lazy(&'a dyn Fn() -> String),
    /// Values joined with single spaces
    Values(&'a [&'a dyn fmt::Display]),
}

impl Message<'_> {
    pub fn render(&self) -> String {
        match self {
            Message::Format(args) => match args.as_str() {
                Some(s) => s.to_string(),
                None => fmt::format(*args),
            },
            Message::Text(text) => (*text).to_string(),
            Message::Lazy(producer) => producer(),
            Message::Values(values) => values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl<'a> From<fmt::Arguments<'a>> for Message<'a> {
    fn from(args: fmt::Arguments<'a>) -> Self {
        Message::Format(args)
    }
}

impl<'a> From<&'a str> for Message<'a> {
    fn from(text: &'a str) -> Self {
        Message::Text(text)
    }
}

impl<'a> From<&'a String> for Message<'a> {
    fn from(text: &'a String) -> Self {
        Message::Text(text.as_str())
    }
}

impl<'a> From<&'a [&'a dyn fmt::Display]> for Message<'a> {
    fn from(values: &'a [&'a dyn fmt::Display]) -> Self {
        Message::Values(values)
    }
}

impl fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Format(args) => f.debug_tuple("Format").field(args).finish(),
            Message::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Message::Lazy(_) => f.write_str("Lazy(..)"),
            Message::Values(values) => f.debug_tuple("Values").field(&values.len()).finish(),
        }
    }
}

/// Logging handle bound to one category of a [`Registry`].
///
/// Cheap to clone. The source location of every record is the caller of the
/// leveled method (or of the macro wrapping it).
///
/// # Example
///
/// ```
/// use category_logger::core::{Level, Message, Registry};
/// use category_logger::writers::ConsoleWriter;
/// use std::sync::Arc;
///
/// let registry = Arc::new(Registry::new(
///     Level::Debug,
///     Arc::new(ConsoleWriter::new().unwrap()),
/// ));
/// let log = registry.logger("http");
///
/// log.info(format_args!("GET /health -> {}", 200));
/// log.debug(Message::Lazy(&|| "computed only when DEBUG is on".to_string()));
/// log.warn(Message::Values(&[&"slow", &512, &"ms"]));
/// registry.close();
/// ```
#[derive(Clone)]
pub struct Logger {
    registry: Arc<Registry>,
    category: String,
}

impl Logger {
    pub fn new(registry: Arc<Registry>, category: impl Into<String>) -> Self {
        Self {
            registry,
            category: category.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Whether a record at `level` would reach any writer
    pub fn enabled(&self, level: Level) -> bool {
        self.registry.enabled(level, &self.category)
    }

    #[track_caller]
    pub fn log<'a>(&self, level: Level, message: impl Into<Message<'a>>) {
        let location = Location::caller();
        self.registry.dispatch(
            level,
            &self.category,
            || source_of(location),
            message.into(),
        );
    }

    /// Log with a caller-supplied source instead of the call site.
    pub fn log_raw(&self, level: Level, source: &str, message: &str) {
        self.registry.dispatch(
            level,
            &self.category,
            || source.to_string(),
            Message::Text(message),
        );
    }

    #[track_caller]
    pub fn trace<'a>(&self, message: impl Into<Message<'a>>) {
        self.log(Level::Trace, message);
    }

    #[track_caller]
    pub fn debug<'a>(&self, message: impl Into<Message<'a>>) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn info<'a>(&self, message: impl Into<Message<'a>>) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn warn<'a>(&self, message: impl Into<Message<'a>>) {
        self.log(Level::Warn, message);
    }

    #[track_caller]
    pub fn error<'a>(&self, message: impl Into<Message<'a>>) {
        self.log(Level::Error, message);
    }

    #[track_caller]
    pub fn fatal<'a>(&self, message: impl Into<Message<'a>>) {
        self.log(Level::Fatal, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("category", &self.category)
            .finish()
    }
}
