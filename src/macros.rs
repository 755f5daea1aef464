//! Logging macros for ergonomic log message formatting.
//!
//! The message is built with `format_args!`, so nothing is formatted unless a
//! writer will take the record. A `lazy:` closure defers arbitrary work the
//! same way.
//!
//! # Examples
//!
//! ```
//! use category_logger::prelude::*;
//! use category_logger::{debug, info};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::new(Level::Info, Arc::new(ConsoleWriter::new().unwrap())));
//! let log = registry.logger("server");
//!
//! info!(log, "Server started");
//!
//! let port = 8080;
//! info!(log, "Server listening on port {}", port);
//!
//! // Never evaluated: DEBUG is below the threshold
//! debug!(log, lazy: || format!("{:?}", std::env::vars().collect::<Vec<_>>()));
//! registry.close();
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use category_logger::prelude::*;
/// # use std::sync::Arc;
/// # let registry = Arc::new(Registry::new(Level::Trace, Arc::new(ConsoleWriter::new().unwrap())));
/// # let logger = registry.logger("app");
/// use category_logger::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// log!(logger, Level::Debug, lazy: || "expensive".to_string());
/// # registry.close();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, lazy: $producer:expr) => {
        $logger.log($level, $crate::Message::Lazy(&$producer))
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, $crate::Message::Format(format_args!($($arg)+)))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use category_logger::prelude::*;
/// # use std::sync::Arc;
/// # let registry = Arc::new(Registry::new(Level::Trace, Arc::new(ConsoleWriter::new().unwrap())));
/// # let logger = registry.logger("app");
/// use category_logger::debug;
/// debug!(logger, "Counter value: {}", 10);
/// # registry.close();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use category_logger::prelude::*;
/// # use std::sync::Arc;
/// # let registry = Arc::new(Registry::new(Level::Trace, Arc::new(ConsoleWriter::new().unwrap())));
/// # let logger = registry.logger("app");
/// use category_logger::error;
/// let path = "/etc/app.toml";
/// error!(logger, "Failed to open file: {}", path);
/// # registry.close();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message. Does not abort the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}
