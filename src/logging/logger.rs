//! Logger - per-component facade over the log archive

use super::{LogArchive, LogEntry, LogLevel};
use chrono::Local;
use std::fmt;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-key logger bound to one logical component
///
/// Obtained through [`LogArchive::logger`]. Holds only a weak reference to
/// the archive: once the owning runtime context is torn down every call
/// becomes a no-op.
pub struct Logger {
    key: String,
    prefix: String,
    active: AtomicBool,
    debug_active: AtomicBool,
    archive: Weak<LogArchive>,
}

impl Logger {
    pub(crate) fn new(key: impl Into<String>, prefix: impl Into<String>, archive: Weak<LogArchive>) -> Self {
        Self {
            key: key.into(),
            prefix: prefix.into(),
            active: AtomicBool::new(true),
            debug_active: AtomicBool::new(false),
            archive,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_debug_active(&self) -> bool {
        self.debug_active.load(Ordering::SeqCst)
    }

    pub(crate) fn set_active(&self, is_active: bool) {
        self.active.store(is_active, Ordering::SeqCst);
    }

    pub(crate) fn set_debug_active(&self, is_active: bool) {
        self.debug_active.store(is_active, Ordering::SeqCst);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message.into(), None);
    }

    pub fn info_in(&self, message: impl Into<String>, context: impl Into<String>) {
        self.log(LogLevel::Info, message.into(), Some(context.into()));
    }

    pub fn user_action(&self, message: impl Into<String>) {
        self.log(LogLevel::UserAction, message.into(), None);
    }

    pub fn user_action_in(&self, message: impl Into<String>, context: impl Into<String>) {
        self.log(LogLevel::UserAction, message.into(), Some(context.into()));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message.into(), None);
    }

    pub fn debug_in(&self, message: impl Into<String>, context: impl Into<String>) {
        self.log(LogLevel::Debug, message.into(), Some(context.into()));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message.into(), None);
    }

    pub fn warning_in(&self, message: impl Into<String>, context: impl Into<String>) {
        self.log(LogLevel::Warning, message.into(), Some(context.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message.into(), None);
    }

    pub fn error_in(&self, message: impl Into<String>, context: impl Into<String>) {
        self.log(LogLevel::Error, message.into(), Some(context.into()));
    }

    fn log(&self, level: LogLevel, message: String, context: Option<String>) {
        if !self.is_active() {
            return;
        }
        if level == LogLevel::Debug && !self.is_debug_active() {
            return;
        }
        let Some(archive) = self.archive.upgrade() else {
            return;
        };

        archive.archive(LogEntry {
            message,
            context: context.unwrap_or_else(|| self.key.clone()),
            prefix: self.prefix.clone(),
            logger_key: self.key.clone(),
            level,
            timestamp: Local::now(),
        });
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("key", &self.key)
            .field("prefix", &self.prefix)
            .field("active", &self.is_active())
            .field("debug_active", &self.is_debug_active())
            .finish()
    }
}
