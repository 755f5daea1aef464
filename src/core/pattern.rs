//! Format-string renderer shared by every writer
//!
//! A pattern mixes literal text with `%` directives:
//!
//! | Directive | Output                       |
//! |-----------|------------------------------|
//! | `%T`      | time, `15:04:05 +00:00`      |
//! | `%t`      | short time, `15:04`          |
//! | `%D`      | date, `2006/01/02`           |
//! | `%d`      | short date, `01/02/06`       |
//! | `%L`      | level name                   |
//! | `%S`      | source (`file:line`)         |
//! | `%M`      | message                      |
//! | `%C`      | category                     |
//!
//! Unknown directives are dropped together with their `%`.

use super::record::Record;
use std::fmt::Write;

/// Default line layout used by file and socket writers.
pub const DEFAULT_PATTERN: &str = "[%D %T] [%L] (%S) %M";

pub const XML_RECORD_PATTERN: &str = "\t<record level=\"%L\">\n\
\t\t<timestamp>%D %T</timestamp>\n\
\t\t<source>%S</source>\n\
\t\t<message>%M</message>\n\
\t</record>";
pub const XML_HEADER: &str = "<log created=\"%D %T\">";
pub const XML_TRAILER: &str = "</log>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Time,
    ShortTime,
    Date,
    ShortDate,
    Level,
    Source,
    Message,
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Directive(Directive),
}

/// A precompiled pattern.
///
/// # Example
///
/// ```
/// use category_logger::{Level, Pattern, Record};
///
/// let pattern = Pattern::new("[%L] %C: %M%Q");
/// let record = Record::new(Level::Warn, "db", "main.rs:7", "slow query");
/// assert_eq!(pattern.render(&record), "[WARN] db: slow query");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let directive = match chars.next() {
                Some('T') => Directive::Time,
                Some('t') => Directive::ShortTime,
                Some('D') => Directive::Date,
                Some('d') => Directive::ShortDate,
                Some('L') => Directive::Level,
                Some('S') => Directive::Source,
                Some('M') => Directive::Message,
                Some('C') => Directive::Category,
                // unknown directive or trailing '%'
                _ => continue,
            };
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Directive(directive));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render one record. The result carries no trailing newline.
    pub fn render(&self, record: &Record) -> String {
        self.render_with_message(record, &record.message)
    }

    /// Render with a substitute message, e.g. a sanitized copy.
    pub fn render_with_message(&self, record: &Record, message: &str) -> String {
        let mut out = String::with_capacity(64 + message.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Directive(directive) => {
                    // Writing into a String cannot fail
                    let _ = match directive {
                        Directive::Time => write!(out, "{}", record.created.format("%H:%M:%S %:z")),
                        Directive::ShortTime => write!(out, "{}", record.created.format("%H:%M")),
                        Directive::Date => write!(out, "{}", record.created.format("%Y/%m/%d")),
                        Directive::ShortDate => write!(out, "{}", record.created.format("%m/%d/%y")),
                        Directive::Level => {
                            out.push_str(record.level.to_str());
                            Ok(())
                        }
                        Directive::Source => {
                            out.push_str(&record.source);
                            Ok(())
                        }
                        Directive::Message => {
                            out.push_str(message);
                            Ok(())
                        }
                        Directive::Category => {
                            out.push_str(&record.category);
                            Ok(())
                        }
                    };
                }
            }
        }
        out
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

impl From<&str> for Pattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

impl From<String> for Pattern {
    fn from(pattern: String) -> Self {
        Self::new(&pattern)
    }
}
