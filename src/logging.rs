//! Logging for the recovery engine.
//!
//! Two concerns live here:
//! - Process-wide diagnostics: [`init_logging`] installs a `tracing` subscriber
//!   writing to stderr, honoring `RUST_LOG` when set.
//! - The error log collaborator: a [`LogSink`] receives one structured entry per
//!   handled error. Sinks are fire-and-forget; the orchestrator swallows their
//!   failures.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Severity;

/// Log level configuration for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// Filter directive applying this level to the crate's own events; other
    /// crates stay at `warn` unless the level is quieter than that.
    fn directive(self) -> String {
        let level = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => return "error".to_string(),
            LogLevel::Off => return "off".to_string(),
        };
        format!("warn,{}={level}", env!("CARGO_CRATE_NAME"))
    }
}

impl From<u8> for LogLevel {
    /// Convert verbosity count to log level.
    /// 0 = Warn, 1 = Info, 2 = Debug, 3+ = Trace
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Configuration for the diagnostics subscriber.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub with_timestamps: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_timestamps: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Create a configuration from a `-v` count.
    pub fn from_verbosity(verbosity: u8) -> Self {
        Self::default().with_level(LogLevel::from(verbosity))
    }
}

/// Initialize the diagnostics subscriber.
///
/// Call once at startup. A second call is a no-op rather than a panic, so
/// tests and embedding applications can call it freely.
pub fn init_logging(config: LoggingConfig) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.level.directive())
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(config.with_target);

    let result = if config.with_timestamps {
        subscriber.try_init()
    } else {
        subscriber.without_time().try_init()
    };
    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Failure reported by a [`LogSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("log buffer lock poisoned")]
    Poisoned,
    #[error("log sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives one structured entry per handled error.
pub trait LogSink: Send + Sync {
    fn record(&self, severity: Severity, payload: &Value) -> Result<(), SinkError>;
}

/// Emits entries as `tracing` events, level scaled by severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, severity: Severity, payload: &Value) -> Result<(), SinkError> {
        match severity {
            Severity::Low => tracing::debug!(%payload, "recoverable error handled"),
            Severity::Medium => tracing::info!(%payload, "error handled"),
            Severity::High => tracing::warn!(%payload, "high severity error handled"),
            Severity::Critical => tracing::error!(%payload, "critical error handled"),
        }
        Ok(())
    }
}

/// One entry in a [`BufferedSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub payload: Value,
    pub recorded_at: DateTime<Utc>,
}

/// Bounded, append-only in-memory log. At capacity the oldest entry is evicted.
#[derive(Debug)]
pub struct BufferedSink {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl BufferedSink {
    /// Creates a buffer holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the buffered entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for BufferedSink {
    fn record(&self, severity: Severity, payload: &Value) -> Result<(), SinkError> {
        let mut entries = self.entries.lock().map_err(|_| SinkError::Poisoned)?;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            severity,
            payload: payload.clone(),
            recorded_at: Utc::now(),
        });
        Ok(())
    }
}
