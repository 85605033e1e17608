//! Runtime Context
//!
//! Process-scoped state (configuration and the log archive) created once with
//! [`RuntimeContext::init`] and passed to every component that needs it.
//! [`RuntimeContext::teardown`] releases it; loggers handed out earlier stop
//! recording once the archive is gone.

use crate::config::RuntimeConfig;
use crate::logging::{LogArchive, Logger};
use std::sync::Arc;

#[derive(Debug)]
pub struct RuntimeContext {
    config: RuntimeConfig,
    log_archive: Arc<LogArchive>,
}

impl RuntimeContext {
    /// Create the context and its log archive
    pub fn init(config: RuntimeConfig) -> Self {
        let log_archive = LogArchive::new(&config.logging);
        tracing::debug!(
            "Runtime context initialized (archive capacity {})",
            config.logging.archive_capacity
        );
        Self {
            config,
            log_archive,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn log_archive(&self) -> &Arc<LogArchive> {
        &self.log_archive
    }

    /// Logger for a logical component
    pub fn logger(&self, key: &str) -> Arc<Logger> {
        self.log_archive.logger(key)
    }

    /// Release the archive, its loggers and subscribers
    pub fn teardown(self) {
        self.log_archive.shutdown();
        tracing::debug!("Runtime context torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_silences_loggers() {
        let context = RuntimeContext::init(RuntimeConfig::default());
        let logger = context.logger("teardown");
        logger.info("before");
        assert_eq!(context.log_archive().len(), 1);

        let archive = Arc::downgrade(context.log_archive());
        context.teardown();

        assert!(archive.upgrade().is_none());
        logger.info("after");
    }
}
