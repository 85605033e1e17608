//! LogArchive - bounded in-memory log with change notification
//!
//! Holds the newest-first ring of [`LogEntry`] values, the registry of
//! per-key [`Logger`]s, and a version counter that subscribers observe.
//! Every mutating call (archive, clear, activation toggles) bumps the
//! version exactly once.
//!
//! Nothing here reports failure to the caller. A subscriber that panics is
//! contained and reported through `tracing`.

use super::{LogEntry, LogLevel, Logger};
use crate::config::LoggingConfig;
use crate::eventing::{SubscriptionKey, VersionedChannel};
use crate::helpers::BoundedDeque;
use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Handler receiving `(version, reason)` on every archive change
pub type LogChangesHandler = dyn Fn(u64, &str) + Send + Sync;

pub struct LogArchive {
    entries: Mutex<BoundedDeque<LogEntry>>,
    changes: VersionedChannel<LogChangesHandler>,
    loggers: RwLock<AHashMap<String, Arc<Logger>>>,
    default_prefix: String,
    /// Debug flag new and re-fetched loggers are synchronized to
    debug_default: AtomicBool,
    console: AtomicBool,
    this: Weak<LogArchive>,
}

impl LogArchive {
    /// Create an archive from the logging configuration
    pub fn new(config: &LoggingConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            entries: Mutex::new(BoundedDeque::new(config.archive_capacity)),
            changes: VersionedChannel::new(),
            loggers: RwLock::new(AHashMap::new()),
            default_prefix: config.default_prefix.clone(),
            debug_default: AtomicBool::new(config.debug),
            console: AtomicBool::new(config.console),
            this: this.clone(),
        })
    }

    // ==================== Loggers ====================

    /// Get the logger for `key`, creating it with the default prefix
    pub fn logger(&self, key: &str) -> Arc<Logger> {
        self.logger_with_prefix(key, None)
    }

    /// Get the logger for `key`, creating it with `prefix` if it does not exist
    ///
    /// Repeated lookups return the same instance and re-synchronize its debug
    /// flag from the global default.
    pub fn logger_with_prefix(&self, key: &str, prefix: Option<&str>) -> Arc<Logger> {
        let debug_default = self.debug_default.load(Ordering::SeqCst);

        if let Some(logger) = self.loggers.read().get(key) {
            logger.set_debug_active(debug_default);
            return logger.clone();
        }

        let mut loggers = self.loggers.write();
        let logger = loggers
            .entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(Logger::new(
                    key,
                    prefix.unwrap_or(self.default_prefix.as_str()),
                    self.this.clone(),
                ))
            })
            .clone();
        logger.set_debug_active(debug_default);
        logger
    }

    /// Keys of all registered loggers, sorted
    pub fn logger_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.loggers.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Enable or disable one logger, or all loggers when `key` is `None`
    pub fn set_active(&self, is_active: bool, key: Option<&str>) {
        match key {
            None => {
                for logger in self.loggers.read().values() {
                    logger.set_active(is_active);
                }
                self.update_version("Activation changed for all loggers.");
            }
            Some(key) => {
                if let Some(logger) = self.loggers.read().get(key) {
                    logger.set_active(is_active);
                }
                self.update_version(format!("Activation changed for logger '{key}'."));
            }
        }
    }

    /// Enable or disable debug output for one logger, or all loggers when `key` is `None`
    ///
    /// The all-loggers form also changes the default seeded into new loggers.
    pub fn set_debug_active(&self, is_active: bool, key: Option<&str>) {
        match key {
            None => {
                self.debug_default.store(is_active, Ordering::SeqCst);
                for logger in self.loggers.read().values() {
                    logger.set_debug_active(is_active);
                }
                self.update_version("Debug logging changed for all loggers.");
            }
            Some(key) => {
                if let Some(logger) = self.loggers.read().get(key) {
                    logger.set_debug_active(is_active);
                }
                self.update_version(format!("Debug logging changed for logger '{key}'."));
            }
        }
    }

    pub fn is_debug_default(&self) -> bool {
        self.debug_default.load(Ordering::SeqCst)
    }

    // ==================== Archive ====================

    /// Prepend an entry, evicting the oldest past the bound
    pub fn archive(&self, entry: LogEntry) {
        let mirror = self
            .console
            .load(Ordering::SeqCst)
            .then(|| (entry.level, entry.console_line()));

        self.entries.lock().push(entry);
        self.update_version("New log entry received.");

        if let Some((level, line)) = mirror {
            mirror_to_console(level, &line);
        }
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.update_version("All logs cleared.");
    }

    /// Snapshot of the archive, newest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().capacity()
    }

    pub fn set_console_logging(&self, enabled: bool) {
        self.console.store(enabled, Ordering::SeqCst);
    }

    pub fn is_console_logging(&self) -> bool {
        self.console.load(Ordering::SeqCst)
    }

    // ==================== Change Notification ====================

    pub fn version(&self) -> u64 {
        self.changes.version()
    }

    /// Subscribe to archive changes
    ///
    /// Subscribing a handler that is already registered keeps the existing
    /// subscription. Either way the handler is invoked once right away with
    /// the current version.
    pub fn subscribe(&self, handler: Arc<LogChangesHandler>) -> SubscriptionKey {
        let (key, _) = self.changes.subscribe_unique("log", handler.clone());
        deliver(&*handler, self.changes.version(), "Successfully registered");
        key
    }

    /// Remove a subscription, returning whether it existed
    pub fn unsubscribe(&self, key: &SubscriptionKey) -> bool {
        self.changes.unsubscribe(key)
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }

    /// Drop entries, loggers and subscribers; used on context teardown
    pub(crate) fn shutdown(&self) {
        self.changes.clear_subscribers();
        self.loggers.write().clear();
        self.entries.lock().clear();
    }

    fn update_version(&self, reason: impl Into<Arc<str>>) {
        self.changes.bump(reason, deliver);
    }
}

fn deliver(handler: &LogChangesHandler, version: u64, reason: &str) {
    if catch_unwind(AssertUnwindSafe(|| handler(version, reason))).is_err() {
        tracing::warn!("Log archive subscriber panicked at version {}", version);
    }
}

fn mirror_to_console(level: LogLevel, line: &str) {
    match level {
        LogLevel::Debug => tracing::debug!("{}", line),
        LogLevel::Info => tracing::info!("{}", line),
        LogLevel::Warning => tracing::warn!("{}", line),
        LogLevel::Error => tracing::error!("{}", line),
        // User actions are archived only
        LogLevel::UserAction => {}
    }
}

impl fmt::Debug for LogArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogArchive")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("version", &self.version())
            .field("loggers", &self.loggers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive_with_capacity(capacity: usize) -> Arc<LogArchive> {
        LogArchive::new(&LoggingConfig {
            archive_capacity: capacity,
            console: false,
            ..LoggingConfig::default()
        })
    }

    fn recorder() -> (Arc<LogChangesHandler>, Arc<Mutex<Vec<(u64, String)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: Arc<LogChangesHandler> =
            Arc::new(move |version: u64, reason: &str| sink.lock().push((version, reason.to_string())));
        (handler, seen)
    }

    #[test]
    fn test_archive_is_bounded_and_newest_first() {
        let archive = archive_with_capacity(5);
        let logger = archive.logger("bounded");

        for i in 0..12 {
            logger.info(format!("message {i}"));
            assert!(archive.len() <= 5);
        }

        let messages: Vec<String> = archive.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            vec!["message 11", "message 10", "message 9", "message 8", "message 7"]
        );
    }

    #[test]
    fn test_subscribe_replays_current_version() {
        let archive = archive_with_capacity(10);
        let logger = archive.logger("replay");
        logger.info("one");
        logger.info("two");

        let (handler, seen) = recorder();
        archive.subscribe(handler);

        assert_eq!(seen.lock().as_slice(), &[(2, "Successfully registered".to_string())]);
    }

    #[test]
    fn test_version_increments_once_per_mutation() {
        let archive = archive_with_capacity(10);
        let (handler, seen) = recorder();
        archive.subscribe(handler);
        let logger = archive.logger("versions");

        logger.info("entry");
        archive.set_active(true, None);
        archive.set_debug_active(true, Some("versions"));
        archive.clear();

        let versions: Vec<u64> = seen.lock().iter().map(|(v, _)| *v).collect();
        assert_eq!(versions, vec![0, 1, 2, 3, 4]);
        assert_eq!(seen.lock()[4].1, "All logs cleared.");
        assert!(archive.is_empty());
    }

    #[test]
    fn test_subscribe_same_handler_is_idempotent() {
        let archive = archive_with_capacity(10);
        let (handler, seen) = recorder();

        let first = archive.subscribe(handler.clone());
        let second = archive.subscribe(handler);
        assert_eq!(first, second);
        assert_eq!(archive.subscriber_count(), 1);

        archive.logger("idem").info("entry");
        // Two replays plus exactly one notification for the entry
        assert_eq!(seen.lock().len(), 3);

        assert!(archive.unsubscribe(&first));
        assert!(!archive.unsubscribe(&first));
    }

    #[test]
    fn test_panicking_subscriber_does_not_escape() {
        let archive = archive_with_capacity(10);
        archive.subscribe(Arc::new(|version: u64, _: &str| {
            if version > 0 {
                panic!("subscriber failure");
            }
        }));
        let (handler, seen) = recorder();
        archive.subscribe(handler);

        archive.logger("panics").error("still archived");

        assert_eq!(archive.len(), 1);
        assert_eq!(seen.lock().last().map(|(v, _)| *v), Some(1));
    }

    #[test]
    fn test_logger_registry_returns_same_instance() {
        let archive = archive_with_capacity(10);
        let a = archive.logger("shared");
        let b = archive.logger_with_prefix("shared", Some("OTHER"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.prefix(), "WEB");
        assert_eq!(archive.logger_keys(), vec!["shared".to_string()]);
    }

    #[test]
    fn test_lookup_resyncs_debug_flag() {
        let archive = archive_with_capacity(10);
        let logger = archive.logger("debuggable");
        assert!(!logger.is_debug_active());

        archive.set_debug_active(true, Some("debuggable"));
        assert!(logger.is_debug_active());

        // Re-fetching resets the flag to the global default
        let again = archive.logger("debuggable");
        assert!(!again.is_debug_active());

        archive.set_debug_active(true, None);
        assert!(archive.logger("fresh").is_debug_active());
    }

    #[test]
    fn test_inactive_and_debug_filtering() {
        let archive = archive_with_capacity(10);
        let logger = archive.logger("filtered");

        logger.debug("hidden: debug off");
        assert!(archive.is_empty());

        archive.set_debug_active(true, Some("filtered"));
        logger.debug("visible");
        assert_eq!(archive.len(), 1);

        archive.set_active(false, Some("filtered"));
        logger.error("hidden: inactive");
        logger.debug("hidden: inactive");
        assert_eq!(archive.len(), 1);

        archive.set_active(true, None);
        logger.user_action_in("clicked", "toolbar");
        let newest = archive.entries().remove(0);
        assert_eq!(newest.level, LogLevel::UserAction);
        assert_eq!(newest.context, "toolbar");
        assert_eq!(newest.logger_key, "filtered");
    }

    #[test]
    fn test_context_defaults_to_logger_key() {
        let archive = archive_with_capacity(10);
        archive.logger_with_prefix("ctx", Some("APP")).warning("careful");
        let entry = archive.entries().remove(0);
        assert_eq!(entry.context, "ctx");
        assert_eq!(entry.console_line(), "APP | ctx | careful");
    }

    #[test]
    fn test_logger_is_noop_after_archive_dropped() {
        let archive = archive_with_capacity(10);
        let logger = archive.logger("orphan");
        drop(archive);
        logger.error("nobody listens");
        assert_eq!(logger.key(), "orphan");
    }
}
