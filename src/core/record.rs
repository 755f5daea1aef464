//! Log record structure

use super::log_level::Level;
use chrono::{DateTime, Local};
use std::panic::Location;

/// A single accepted log call.
///
/// Records are built once by the dispatch layer and shared between writer
/// queues behind an `Arc`; nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub level: Level,
    pub created: DateTime<Local>,
    pub source: String,
    pub message: String,
    pub category: String,
}

impl Record {
    pub fn new(
        level: Level,
        category: impl Into<String>,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            created: Local::now(),
            source: source.into(),
            message: message.into(),
            category: category.into(),
        }
    }

    /// Record with no payload, used to render file headers and trailers.
    pub fn stamp(created: DateTime<Local>) -> Self {
        Self {
            level: Level::Info,
            created,
            source: String::new(),
            message: String::new(),
            category: String::new(),
        }
    }

    pub fn with_created(mut self, created: DateTime<Local>) -> Self {
        self.created = created;
        self
    }

    /// Escape line terminators so an embedded newline cannot forge a new entry.
    pub fn sanitized_message(&self) -> String {
        self.message.replace('\n', "\\n").replace('\r', "\\r")
    }
}

/// Formats a caller location the way `%S` expects it.
pub fn source_of(location: &Location<'_>) -> String {
    format!("{}:{}", location.file(), location.line())
}
