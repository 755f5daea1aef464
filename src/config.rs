//! JSON configuration for building a [`Registry`]
//!
//! ```json
//! {
//!   "console": { "enable": true, "level": "INFO" },
//!   "files": [
//!     { "enable": true, "category": "db", "level": "DEBUG",
//!       "filename": "logs/db.log", "rotate": true, "maxsize": "10M", "maxbackup": 5 }
//!   ],
//!   "sockets": [
//!     { "enable": true, "category": "audit", "level": "WARN",
//!       "addr": "127.0.0.1:5140", "protocol": "udp" }
//!   ]
//! }
//! ```

use crate::core::{Level, LoggerError, Registry, Result, DEFAULT_BUFFER_LENGTH};
use crate::writers::{ConnectionWriter, ConsoleWriter, FileWriter, Protocol};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Suffix multiplier for byte sizes (`K` = 1024)
pub const BYTE_MULTIPLIER: u64 = 1024;
/// Suffix multiplier for line counts (`K` = 1000)
pub const LINE_MULTIPLIER: u64 = 1000;

/// A size given either as a bare number or as text with an optional suffix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Number(u64),
    Text(String),
}

impl SizeValue {
    /// Resolve against `multiplier` (see [`parse_size`])
    pub fn resolve(&self, multiplier: u64) -> Result<u64> {
        match self {
            SizeValue::Number(n) => Ok(*n),
            SizeValue::Text(text) => parse_size(text, multiplier),
        }
    }
}

/// Parse `<digits>[K|M|G]`, case-insensitive.
///
/// Each suffix step multiplies by `multiplier`: with 1024, `"1K"` is 1024 and
/// `"2M"` is 2 097 152.
///
/// # Errors
///
/// Returns error for empty input, non-numeric digits or overflow
pub fn parse_size(value: &str, multiplier: u64) -> Result<u64> {
    let trimmed = value.trim();
    let invalid = |reason: &str| LoggerError::config("size", format!("'{}': {}", value, reason));

    let (digits, exponent) = match trimmed.chars().last() {
        None => return Err(invalid("empty value")),
        Some('K' | 'k') => (&trimmed[..trimmed.len() - 1], 1),
        Some('M' | 'm') => (&trimmed[..trimmed.len() - 1], 2),
        Some('G' | 'g') => (&trimmed[..trimmed.len() - 1], 3),
        Some(_) => (trimmed, 0),
    };

    let base: u64 = digits
        .trim()
        .parse()
        .map_err(|_| invalid("expected a number with optional K, M or G suffix"))?;

    multiplier
        .checked_pow(exponent)
        .and_then(|factor| base.checked_mul(factor))
        .ok_or_else(|| invalid("value too large"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enable: bool,
    pub level: Option<Level>,
    pub pattern: Option<String>,
    pub color: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enable: bool,
    pub category: String,
    pub level: Option<Level>,
    pub filename: String,
    pub pattern: Option<String>,
    /// Keep rotated files as numbered or dated backups
    pub rotate: bool,
    pub maxsize: Option<SizeValue>,
    #[serde(rename = "maxLines", alias = "MaxLines", alias = "maxlines")]
    pub max_lines: Option<SizeValue>,
    pub daily: bool,
    pub sanitize: bool,
    pub maxbackup: Option<usize>,
    pub header: Option<String>,
    pub trailer: Option<String>,
    /// `"text"` (default) or `"xml"`
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    pub enable: bool,
    pub category: String,
    pub level: Option<Level>,
    pub pattern: Option<String>,
    pub addr: String,
    pub protocol: Option<String>,
    #[serde(rename = "reconnectOnMsg", alias = "reconnect_on_msg")]
    pub reconnect_on_msg: bool,
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub console: Option<ConsoleConfig>,
    pub files: Vec<FileConfig>,
    pub sockets: Vec<SocketConfig>,
    /// Queue capacity of every writer
    #[serde(rename = "bufferLength", alias = "buffer_length")]
    pub buffer_length: Option<usize>,
}

impl LogConfig {
    /// # Errors
    ///
    /// Returns error if the document is not valid JSON for this layout
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "read configuration",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json(&content)
    }

    fn capacity(&self) -> usize {
        self.buffer_length.unwrap_or(DEFAULT_BUFFER_LENGTH)
    }
}

fn require_level(component: &str, level: Option<Level>) -> Result<Level> {
    level.ok_or_else(|| LoggerError::config(component, "missing 'level'"))
}

fn require<'a>(component: &str, field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(LoggerError::config(component, format!("missing '{}'", field)))
    } else {
        Ok(value)
    }
}

fn build_console(config: Option<&ConsoleConfig>, capacity: usize) -> Result<(Level, ConsoleWriter, bool)> {
    let mut builder = ConsoleWriter::builder().capacity(capacity);
    match config.filter(|c| c.enable) {
        Some(console) => {
            let level = require_level("console", console.level)?;
            if let Some(pattern) = console.pattern.as_deref() {
                builder = builder.pattern(pattern);
            }
            Ok((level, builder.colors(console.color).build()?, true))
        }
        // Fallback for unknown categories only
        None => Ok((Level::Trace, builder.build()?, false)),
    }
}

fn build_file(index: usize, config: &FileConfig, capacity: usize) -> Result<FileWriter> {
    let component = format!("files[{}]", index);
    let filename = require(&component, "filename", &config.filename)?;

    let mut builder = FileWriter::builder(filename)
        .capacity(capacity)
        .keep_history(config.rotate)
        .daily(config.daily)
        .sanitize(config.sanitize);

    match config.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("text") | Some("") => {}
        Some("xml") => builder = builder.xml(),
        Some(other) => {
            return Err(LoggerError::config(
                &component,
                format!("unknown format '{}', expected text or xml", other),
            ))
        }
    }
    if let Some(pattern) = config.pattern.as_deref() {
        builder = builder.pattern(pattern);
    }
    if config.header.is_some() || config.trailer.is_some() {
        builder = builder.header_footer(
            config.header.as_deref().unwrap_or(""),
            config.trailer.as_deref().unwrap_or(""),
        );
    }
    if let Some(size) = &config.maxsize {
        builder = builder.max_bytes(size.resolve(BYTE_MULTIPLIER)?);
    }
    if let Some(lines) = &config.max_lines {
        builder = builder.max_lines(lines.resolve(LINE_MULTIPLIER)?);
    }
    if let Some(max_backup) = config.maxbackup {
        builder = builder.max_backup(max_backup);
    }

    builder.build()
}

fn build_socket(index: usize, config: &SocketConfig, capacity: usize) -> Result<ConnectionWriter> {
    let component = format!("sockets[{}]", index);
    let addr = require(&component, "addr", &config.addr)?;
    let protocol: Protocol = config.protocol.as_deref().unwrap_or("tcp").parse()?;

    let mut builder = ConnectionWriter::builder(addr)
        .protocol(protocol)
        .reconnect_on_msg(config.reconnect_on_msg)
        .capacity(capacity);
    if let Some(pattern) = config.pattern.as_deref() {
        builder = builder.pattern(pattern);
    }
    builder.build()
}

impl Registry {
    /// Build every enabled writer in `config` and register it.
    ///
    /// The console becomes the default entry. With the console disabled the
    /// default entry still exists as the fallback for unknown categories, but
    /// records are no longer mirrored to it.
    ///
    /// # Errors
    ///
    /// Returns error on a bad level, size, protocol or format, a missing
    /// required field, or a writer that cannot be opened
    pub fn from_config(config: &LogConfig) -> Result<Self> {
        let capacity = config.capacity();
        let (level, console, mirror) = build_console(config.console.as_ref(), capacity)?;
        let registry = Registry::new(level, Arc::new(console)).with_mirroring(mirror);

        for (index, file) in config.files.iter().enumerate().filter(|(_, f)| f.enable) {
            let component = format!("files[{}]", index);
            let category = require(&component, "category", &file.category)?;
            let level = require_level(&component, file.level)?;
            let writer = build_file(index, file, capacity)?;
            registry.register(category, level, Arc::new(writer));
        }

        for (index, socket) in config.sockets.iter().enumerate().filter(|(_, s)| s.enable) {
            let component = format!("sockets[{}]", index);
            let category = require(&component, "category", &socket.category)?;
            let level = require_level(&component, socket.level)?;
            let writer = build_socket(index, socket, capacity)?;
            registry.register(category, level, Arc::new(writer));
        }

        Ok(registry)
    }
}
