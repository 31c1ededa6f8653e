//! Logging setup: env-filtered `tracing` into a daily log file plus an
//! in-memory ring buffer the terminal host renders as its log panel.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::lock;

const LOG_FILE_PREFIX: &str = "gridmenu.log";
const LOG_RETENTION_DAYS: u64 = 7;
/// Entries kept for the log panel.
pub const LOG_PANEL_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.pad(name)
    }
}

/// One formatted event as shown in the log panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

pub type LogBuffer = Arc<Mutex<VecDeque<LogEntry>>>;

pub fn new_log_buffer(capacity: usize) -> LogBuffer {
    Arc::new(Mutex::new(VecDeque::with_capacity(capacity)))
}

/// Append `entry`, evicting the oldest entries beyond `capacity`.
pub fn push_entry(buffer: &LogBuffer, entry: LogEntry, capacity: usize) {
    let mut entries = lock(buffer);
    while entries.len() >= capacity.max(1) {
        entries.pop_front();
    }
    entries.push_back(entry);
}

/// Directory for log files.
///
/// `GRIDMENU_LOG_DIR` wins; otherwise `~/Library/Logs/gridmenu` on macOS
/// and `<data dir>/gridmenu/logs` elsewhere.
pub fn log_dir() -> PathBuf {
    log_dir_from(std::env::var("GRIDMENU_LOG_DIR").ok())
}

fn log_dir_from(overridden: Option<String>) -> PathBuf {
    if let Some(dir) = overridden.filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            return home.join("Library").join("Logs").join("gridmenu");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Some(data) = dirs::data_dir() {
            return data.join("gridmenu").join("logs");
        }
    }

    PathBuf::from("logs")
}

/// Delete rotated `gridmenu.log*` files last modified before `max_age`.
fn prune_logs(dir: &Path, max_age: Duration) {
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return;
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let stale = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .is_ok_and(|modified| modified <= cutoff);
        if stale {
            let _ = std::fs::remove_file(entry.path());
        }
    }
}

struct PanelLayer {
    buffer: LogBuffer,
    capacity: usize,
}

impl<S: tracing::Subscriber> Layer<S> for PanelLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        let entry = LogEntry {
            level: LogLevel::from(*event.metadata().level()),
            target: event.metadata().target().to_string(),
            message: fields.into_message(),
        };
        push_entry(&self.buffer, entry, self.capacity);
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<String>,
}

impl FieldCollector {
    fn into_message(self) -> String {
        let mut parts = Vec::with_capacity(self.fields.len() + 1);
        parts.extend(self.message);
        parts.extend(self.fields);
        parts.join(" ")
    }
}

impl tracing::field::Visit for FieldCollector {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{value:?}")),
            name => self.fields.push(format!("{name}={value:?}")),
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            name => self.fields.push(format!("{name}={value}")),
        }
    }
}

/// Install the global subscriber and return the log panel buffer.
///
/// Filter: `GRIDMENU_LOG`, then `RUST_LOG`, default `info`.
pub fn init() -> LogBuffer {
    let buffer = new_log_buffer(LOG_PANEL_CAPACITY);

    let filter = EnvFilter::try_from_env("GRIDMENU_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let dir = log_dir();
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("warning: cannot create log directory {}: {err}", dir.display());
    }
    prune_logs(&dir, Duration::from_secs(LOG_RETENTION_DAYS * 86_400));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(rolling::daily(&dir, LOG_FILE_PREFIX))
        .with_ansi(false)
        .with_target(true);

    let panel_layer = PanelLayer {
        buffer: buffer.clone(),
        capacity: LOG_PANEL_CAPACITY,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(panel_layer)
        .init();

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            level: LogLevel::Info,
            target: "gridmenu_core::test".into(),
            message: message.into(),
        }
    }

    #[test]
    fn explicit_log_dir_wins() {
        assert_eq!(
            log_dir_from(Some("/tmp/gridmenu-logs".into())),
            PathBuf::from("/tmp/gridmenu-logs")
        );
    }

    #[test]
    fn empty_override_falls_back_to_default() {
        assert_eq!(log_dir_from(Some(String::new())), log_dir_from(None));
    }

    #[test]
    fn buffer_evicts_oldest() {
        let buffer = new_log_buffer(3);
        for i in 0..5 {
            push_entry(&buffer, entry(&format!("msg {i}")), 3);
        }
        let entries = buffer.lock().unwrap();
        let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["msg 2", "msg 3", "msg 4"]);
    }

    #[test]
    fn level_converts_and_displays() {
        assert_eq!(LogLevel::from(tracing::Level::WARN), LogLevel::Warn);
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
        assert!(LogLevel::Warn > LogLevel::Info);
    }

    #[test]
    fn collector_joins_message_and_fields() {
        let collector = FieldCollector {
            message: Some("handler failed".into()),
            fields: vec!["template=main".into(), "user=user#1".into()],
        };
        assert_eq!(collector.into_message(), "handler failed template=main user=user#1");
        assert_eq!(FieldCollector::default().into_message(), "");
    }

    #[test]
    fn panel_layer_captures_events() {
        let buffer = new_log_buffer(10);
        let subscriber = tracing_subscriber::registry().with(PanelLayer {
            buffer: buffer.clone(),
            capacity: 10,
        });
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(template = "main", "click handler failed");
        });
        let entries = buffer.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].message, "click handler failed template=main");
    }

    #[test]
    fn prune_only_touches_log_files() {
        let dir = std::env::temp_dir().join(format!("gridmenu-prune-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let rotated = dir.join("gridmenu.log.2025-01-01");
        let unrelated = dir.join("notes.txt");
        std::fs::write(&rotated, "old").unwrap();
        std::fs::write(&unrelated, "keep").unwrap();

        prune_logs(&dir, Duration::ZERO);
        assert!(!rotated.exists());
        assert!(unrelated.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
