//! Pipeline log broadcasting.
//!
//! Every entry is echoed to stderr (stdout may carry CSV output) and
//! broadcast to Server-Sent Events subscribers on `GET /api/logs`. The
//! success/warning/error levels are what an operator UI renders as banners.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Entries buffered per slow subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 100;

/// Log level for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth (detail lines under a step).
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Console rendering: indentation, level marker, message.
    pub fn render(&self) -> String {
        let marker = match self.level {
            LogLevel::Info => "  ",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️ ",
            LogLevel::Error => "❌",
        };
        format!("{}{} {}", "   ".repeat(self.indent as usize + 1), marker, self.message)
    }
}

/// Process-wide broadcaster.
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans log entries out to stderr and all subscribers.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    console: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            console: AtomicBool::new(true),
        }
    }

    /// Publish an entry. Having no subscribers is fine.
    pub fn log(&self, entry: LogEntry) {
        if self.console.load(Ordering::Relaxed) {
            eprintln!("{}", entry.render());
        }
        let _ = self.sender.send(entry);
    }

    /// Receiver for SSE streaming.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    /// Turn stderr echo on or off; subscribers are unaffected.
    pub fn set_console_echo(&self, enabled: bool) {
        self.console.store(enabled, Ordering::Relaxed);
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_entries() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.set_console_echo(false);
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::new(LogLevel::Warning, "Incorrect net value sum 2,500"));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.message, "Incorrect net value sum 2,500");
    }

    #[test]
    fn test_log_without_subscribers() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.set_console_echo(false);
        broadcaster.log(LogEntry::new(LogLevel::Info, "nobody listening"));
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LogEntry::new(LogLevel::Success, "done").with_indent(1);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["message"], "done");
        assert_eq!(json["indent"], 1);
    }

    #[test]
    fn test_render_indents() {
        let flat = LogEntry::new(LogLevel::Info, "a").render();
        let nested = LogEntry::new(LogLevel::Info, "a").with_indent(2).render();
        assert!(nested.len() > flat.len());
        assert!(nested.ends_with(" a"));
    }
}
