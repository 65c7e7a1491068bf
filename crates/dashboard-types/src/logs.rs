//! Runtime log entries captured in memory and log-file tail reports.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Severity of a captured log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum LogLevel {
    /// Very verbose diagnostics.
    Trace,
    /// Diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failure.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// One line held by the runtime log ring buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEntry {
    /// When the line was emitted.
    pub ts: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Rendered message including structured fields.
    pub msg: String,
}

/// Body of `GET /api/runtime-logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RuntimeLogTail {
    /// Always `"runtime"`.
    pub source: String,
    /// Number of entries returned.
    pub count: usize,
    /// Entries, oldest first.
    pub entries: Vec<LogEntry>,
}

/// Body of `GET /api/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogFileTail {
    /// Path that was read, or the first candidate when none exists.
    pub path: String,
    /// Whether any candidate file exists.
    pub exists: bool,
    /// Label of the candidate that was read.
    pub source: String,
    /// Last modification time in RFC 3339, empty when unknown.
    pub mtime: String,
    /// File size in bytes.
    pub size: u64,
    /// The last lines of the file.
    pub content: String,
}
