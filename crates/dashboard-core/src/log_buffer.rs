//! In-memory ring buffer of recent log lines.
//!
//! [`RuntimeLogLayer`] is a `tracing-subscriber` layer that copies every
//! event it sees into a shared [`RuntimeLogBuffer`], which backs
//! `GET /api/runtime-logs`.

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::Utc;
use dashboard_types::{LogEntry, LogLevel};
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Lines kept when no capacity is configured.
pub const DEFAULT_RUNTIME_LOG_CAPACITY: usize = 2000;

/// Fixed-capacity log buffer; the oldest line is dropped when full.
#[derive(Debug)]
pub struct RuntimeLogBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl RuntimeLogBuffer {
    /// Create an empty buffer holding at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append a line.
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The last `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(count);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of buffered lines.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RuntimeLogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_LOG_CAPACITY)
    }
}

/// Collects an event's message and fields into one line.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

impl LineVisitor {
    fn finish(mut self) -> String {
        self.message.push_str(&self.fields);
        self.message
    }
}

const fn level_of(level: &Level) -> LogLevel {
    match *level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        _ => LogLevel::Error,
    }
}

/// Layer that mirrors events into a [`RuntimeLogBuffer`].
#[derive(Debug, Clone)]
pub struct RuntimeLogLayer {
    buffer: Arc<RuntimeLogBuffer>,
}

impl RuntimeLogLayer {
    /// Create a layer writing into `buffer`.
    pub const fn new(buffer: Arc<RuntimeLogBuffer>) -> Self {
        Self { buffer }
    }
}

impl<S: Subscriber> Layer<S> for RuntimeLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        self.buffer.push(LogEntry {
            ts: Utc::now(),
            level: level_of(event.metadata().level()),
            msg: visitor.finish(),
        });
    }
}
