//! File logging plus an in-memory tail for the log viewer overlay.
//!
//! `env_logger` formats and filters as usual (writing to a file, since the
//! TUI owns stdout). [`RingLogger`] wraps it and copies every record that
//! passes the filter into a bounded [`LogBuffer`], which the log viewer
//! reads.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{Level, Log, Metadata, Record};

/// One captured log line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// When the record was logged.
    pub time: DateTime<Local>,
    /// Severity.
    pub level: Level,
    /// Module path or explicit target.
    pub target: String,
    /// Formatted message.
    pub message: String,
}

/// Bounded, shareable buffer of recent log entries.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a buffer keeping the last `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full.
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `env_logger` with a copy of each record kept in a [`LogBuffer`].
#[derive(Debug)]
pub struct RingLogger {
    inner: env_logger::Logger,
    buffer: LogBuffer,
}

impl RingLogger {
    /// Wrap a built `env_logger` logger.
    pub fn new(inner: env_logger::Logger, buffer: LogBuffer) -> Self {
        Self { inner, buffer }
    }
}

impl Log for RingLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);
        self.buffer.push(LogEntry {
            time: Local::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Where the log file goes: `SHELLDOCK_LOG_FILE`, else the config dir,
/// else the temp dir.
pub fn log_path() -> PathBuf {
    if let Ok(path) = std::env::var("SHELLDOCK_LOG_FILE") {
        return PathBuf::from(path);
    }
    crate::config::Config::config_dir()
        .unwrap_or_else(|_| std::env::temp_dir())
        .join("shelldock.log")
}

/// Install the global logger. Returns the buffer the log viewer reads.
pub fn init(buffer_lines: usize) -> Result<LogBuffer> {
    let path = log_path();
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create log file at {}", path.display()))?;
    let inner = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .build();

    let buffer = LogBuffer::new(buffer_lines);
    let max_level = inner.filter();
    log::set_boxed_logger(Box::new(RingLogger::new(inner, buffer.clone())))
        .context("Logger already installed")?;
    log::set_max_level(max_level);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(msg: &str) -> LogEntry {
        LogEntry {
            time: Local::now(),
            level: Level::Info,
            target: "test".into(),
            message: msg.into(),
        }
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let buf = LogBuffer::new(2);
        buf.push(entry("a"));
        buf.push(entry("b"));
        buf.push(entry("c"));
        let msgs: Vec<String> = buf.snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(msgs, vec!["b", "c"]);
    }

    #[test]
    fn test_clones_share_storage() {
        let buf = LogBuffer::new(4);
        let other = buf.clone();
        other.push(entry("x"));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_ring_logger_filters_and_captures() {
        let inner = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Warn)
            .target(env_logger::Target::Pipe(Box::new(std::io::sink())))
            .build();
        let buf = LogBuffer::new(8);
        let logger = RingLogger::new(inner, buf.clone());

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("t")
                .args(format_args!("dropped"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Error)
                .target("t")
                .args(format_args!("kept"))
                .build(),
        );
        let entries = buf.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }
}
