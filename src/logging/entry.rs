//! Log entries and levels

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    UserAction,
    Debug,
    Warning,
    Error,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::UserAction => "USER",
            LogLevel::Debug => "DEBUG",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single archived log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub message: String,
    /// Component or scope the message refers to; defaults to the logger key
    pub context: String,
    pub prefix: String,
    pub logger_key: String,
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    /// Console line: `<prefix> | <loggerKey> | <message>`
    pub fn console_line(&self) -> String {
        format!("{} | {} | {}", self.prefix, self.logger_key, self.message)
    }
}
