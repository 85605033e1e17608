//! Service - lifecycle state machine with versioned change notification
//!
//! Concrete services embed a [`ServiceCore`] and implement the two lifecycle
//! hooks of the [`Service`] trait. The provided `start`/`stop` methods drive
//! the state machine:
//!
//! ```text
//!              start() ── hook OK ──► Running
//!   Unknown ──┤
//!  Initialized└─ hook not OK ──► Error
//!              stop()  ── hook OK ──► Stopped
//!                      └─ hook not OK ──► Error
//! ```
//!
//! Every state or data change goes through [`ServiceCore::update_version`],
//! which bumps the version by one and calls each change subscriber
//! synchronously, in subscription order, with `(version, reason, key)`.
//!
//! Subscriber panics are not caught: a panicking handler aborts the broadcast
//! for the handlers after it. Handlers that need isolation must contain
//! their own failures.

use crate::communication::{Response, ResponseMessage};
use crate::context::RuntimeContext;
use crate::eventing::{SubscriptionKey, VersionedChannel};
use crate::i18n::LocalizableText;
use crate::logging::Logger;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Handler receiving `(version, reason, service_key)` on every change
pub type ChangesHandler = dyn Fn(u64, &str, &str) + Send + Sync;

/// Lifecycle state of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceState {
    #[default]
    Unknown,
    Initialized,
    Running,
    Stopped,
    Error,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceState::Unknown => "Unknown",
            ServiceState::Initialized => "Initialized",
            ServiceState::Running => "Running",
            ServiceState::Stopped => "Stopped",
            ServiceState::Error => "Error",
        };
        f.write_str(label)
    }
}

/// State shared by every service implementation
pub struct ServiceCore {
    key: String,
    display: LocalizableText,
    description: LocalizableText,
    state: Mutex<ServiceState>,
    changes: VersionedChannel<ChangesHandler>,
    logger: Arc<Logger>,
    debug_mode: AtomicBool,
    authentication_token: RwLock<Option<String>>,
    transition_pending: AtomicBool,
}

/// Clears the pending-transition flag when the transition ends
pub(crate) struct TransitionGuard<'a>(&'a AtomicBool);

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ServiceCore {
    /// Create the core for a service with a stable `key`
    pub fn new(context: &RuntimeContext, key: impl Into<String>) -> Self {
        let key = key.into();
        let logger = context.logger(&key);
        Self {
            display: LocalizableText::system("global.nodisplaydefined", "Service?"),
            description: LocalizableText::system("global.nodescriptiondefined", "Description?"),
            key,
            state: Mutex::new(ServiceState::Unknown),
            changes: VersionedChannel::new(),
            logger,
            debug_mode: AtomicBool::new(false),
            authentication_token: RwLock::new(None),
            transition_pending: AtomicBool::new(false),
        }
    }

    /// Set the localizable name and description
    pub fn with_display(mut self, display: LocalizableText, description: LocalizableText) -> Self {
        self.display = display;
        self.description = description;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display(&self) -> &LocalizableText {
        &self.display
    }

    pub fn description(&self) -> &LocalizableText {
        &self.description
    }

    pub fn state(&self) -> ServiceState {
        *self.state.lock()
    }

    pub fn version(&self) -> u64 {
        self.changes.version()
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode.load(Ordering::SeqCst)
    }

    pub fn set_debug_mode(&self, enabled: bool) {
        self.debug_mode.store(enabled, Ordering::SeqCst);
    }

    pub fn authentication_token(&self) -> Option<String> {
        self.authentication_token.read().clone()
    }

    pub fn set_authentication_token(&self, token: &str) {
        *self.authentication_token.write() = Some(token.to_string());
    }

    /// Record that service-specific setup finished
    pub fn mark_initialized(&self) {
        self.update_state(ServiceState::Initialized);
    }

    /// Change the state and notify subscribers
    pub fn update_state(&self, state: ServiceState) {
        *self.state.lock() = state;
        self.update_version(format!("State changed to '{state}'."));
    }

    /// Bump the version and notify every change subscriber
    pub fn update_version(&self, reason: impl Into<String>) -> u64 {
        let reason: String = reason.into();
        let version = self
            .changes
            .bump(reason.as_str(), |handler, version, reason| handler(version, reason, &self.key));
        self.logger
            .debug(format!("Version has been updated to '{version}'. {reason}"));
        version
    }

    /// Subscribe to changes; the handler is invoked once right away
    pub fn on_changes(&self, context_key: &str, handler: Arc<ChangesHandler>) -> SubscriptionKey {
        let key = self.changes.subscribe(context_key, handler.clone());
        self.logger
            .debug(format!("Component with key '{key}' has subscribed on 'Changes'."));
        self.logger.debug(format!(
            "'{}' subscribers on 'Changes'.",
            self.changes.subscriber_count()
        ));

        handler(self.changes.version(), "Subscription successfully", &self.key);
        key
    }

    /// Remove a change subscription
    pub fn off_changes(&self, key: &SubscriptionKey) -> bool {
        let removed = self.changes.unsubscribe(key);
        if removed {
            self.logger
                .debug(format!("Component with key '{key}' has unsubscribed on 'Changes'."));
        } else {
            self.logger
                .error(format!("Component with key '{key}' not registered on 'Changes'."));
        }
        self.logger.debug(format!(
            "'{}' subscribers on 'Changes'.",
            self.changes.subscriber_count()
        ));
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }

    pub(crate) fn reset_subscribers(&self) {
        self.changes.clear_subscribers();
    }

    /// Claim the lifecycle slot, or `None` while another transition runs
    pub(crate) fn begin_transition(&self) -> Option<TransitionGuard<'_>> {
        self.transition_pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| TransitionGuard(&self.transition_pending))
    }

    fn transition_pending_response(&self, operation: &str) -> Response<bool> {
        let display = LocalizableText::system(
            "services.service.transitionpending",
            "Another start or stop is still in progress.",
        );
        let log_text = format!(
            "'{}' rejected {operation}: a lifecycle transition is still pending.",
            self.key
        );
        self.logger.warning(log_text.as_str());
        Response::error(ResponseMessage::new(display, self.key.as_str()).with_log_text(log_text))
    }
}

impl fmt::Debug for ServiceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCore")
            .field("key", &self.key)
            .field("state", &self.state())
            .field("version", &self.version())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Upcast to `Any` so the provider can hand out concrete service types
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A long-lived runtime service
#[async_trait]
pub trait Service: AsAnyArc + Send + Sync {
    /// Shared lifecycle and notification state
    fn core(&self) -> &ServiceCore;

    /// Service-specific setup; decides the outcome of [`Service::start`]
    async fn on_starting(&self) -> Response<bool>;

    /// Service-specific teardown; decides the outcome of [`Service::stop`]
    async fn on_stopping(&self) -> Response<bool>;

    fn key(&self) -> &str {
        self.core().key()
    }

    fn state(&self) -> ServiceState {
        self.core().state()
    }

    fn version(&self) -> u64 {
        self.core().version()
    }

    fn display(&self) -> &LocalizableText {
        self.core().display()
    }

    fn description(&self) -> &LocalizableText {
        self.core().description()
    }

    fn on_changes(&self, context_key: &str, handler: Arc<ChangesHandler>) -> SubscriptionKey {
        self.core().on_changes(context_key, handler)
    }

    fn off_changes(&self, key: &SubscriptionKey) -> bool {
        self.core().off_changes(key)
    }

    fn set_debug_mode(&self, enabled: bool) {
        self.core().set_debug_mode(enabled);
    }

    /// Store the opaque token used to authorize later requests
    fn set_authentication_token(&self, token: &str) {
        self.core().set_authentication_token(token);
    }

    /// Run the start hook and move to `Running` or `Error`
    ///
    /// Rejected with an `Error` envelope, without touching the state, while
    /// another start or stop of the same service is pending.
    async fn start(&self) -> Response<bool> {
        let core = self.core();
        let Some(_transition) = core.begin_transition() else {
            return core.transition_pending_response("start");
        };

        core.logger().info(format!("Starting '{}'.", core.key()));
        core.reset_subscribers();

        let response = self.on_starting().await;
        if response.is_ok() {
            core.logger().info(format!("'{}' is running.", core.key()));
            core.update_state(ServiceState::Running);
        } else {
            core.logger()
                .error(format!("'{}' could not be started.", core.key()));
            core.update_state(ServiceState::Error);
        }

        response
    }

    /// Run the stop hook and move to `Stopped` or `Error`
    async fn stop(&self) -> Response<bool> {
        let core = self.core();
        let Some(_transition) = core.begin_transition() else {
            return core.transition_pending_response("stop");
        };

        core.logger().info(format!("Stopping '{}'.", core.key()));

        let response = self.on_stopping().await;
        if response.is_ok() {
            core.logger().info(format!("'{}' is stopped.", core.key()));
            core.update_state(ServiceState::Stopped);
        } else {
            core.logger()
                .error(format!("'{}' could not be stopped.", core.key()));
            core.update_state(ServiceState::Error);
        }

        core.reset_subscribers();
        response
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::communication::ResponseState;
    use crate::config::RuntimeConfig;
    use std::time::Duration;

    /// Service whose hooks return a fixed outcome after an optional delay
    pub(crate) struct ScriptedService {
        core: ServiceCore,
        outcome: ResponseState,
        delay: Duration,
    }

    impl ScriptedService {
        pub(crate) fn new(context: &RuntimeContext, key: &str, succeed: bool) -> Self {
            Self::with_delay(context, key, succeed, Duration::ZERO)
        }

        pub(crate) fn with_delay(
            context: &RuntimeContext,
            key: &str,
            succeed: bool,
            delay: Duration,
        ) -> Self {
            let outcome = if succeed {
                ResponseState::Ok
            } else {
                ResponseState::Error
            };
            Self {
                core: ServiceCore::new(context, key),
                outcome,
                delay,
            }
        }

        /// Hooks answer with an unresolved envelope
        pub(crate) fn undecided(context: &RuntimeContext, key: &str) -> Self {
            Self {
                core: ServiceCore::new(context, key),
                outcome: ResponseState::Unknown,
                delay: Duration::ZERO,
            }
        }

        async fn outcome(&self) -> Response<bool> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.outcome {
                ResponseState::Ok => Response::ok(true),
                ResponseState::Error => Response::error(ResponseMessage::new(
                    LocalizableText::system("test.hookfailed", "Hook failed."),
                    self.core.key(),
                )),
                ResponseState::Unknown => Response::unknown(),
            }
        }
    }

    #[async_trait]
    impl Service for ScriptedService {
        fn core(&self) -> &ServiceCore {
            &self.core
        }

        async fn on_starting(&self) -> Response<bool> {
            self.outcome().await
        }

        async fn on_stopping(&self) -> Response<bool> {
            self.outcome().await
        }
    }

    pub(crate) fn test_context() -> RuntimeContext {
        let mut config = RuntimeConfig::default();
        config.logging.console = false;
        RuntimeContext::init(config)
    }

    fn recorder() -> (Arc<ChangesHandler>, Arc<Mutex<Vec<(u64, String, String)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: Arc<ChangesHandler> = Arc::new(move |version: u64, reason: &str, key: &str| {
            sink.lock().push((version, reason.to_string(), key.to_string()))
        });
        (handler, seen)
    }

    #[tokio::test]
    async fn test_start_ok_transitions_to_running() {
        let context = test_context();
        let service = ScriptedService::new(&context, "ok-service", true);
        assert_eq!(service.state(), ServiceState::Unknown);

        let response = service.start().await;

        assert!(response.is_ok());
        assert_eq!(service.state(), ServiceState::Running);
        assert_eq!(service.version(), 1);
    }

    #[tokio::test]
    async fn test_start_error_transitions_to_error() {
        let context = test_context();
        let service = ScriptedService::new(&context, "failing-service", false);

        let response = service.start().await;

        assert!(response.is_error());
        assert!(!response.message_stack.is_empty());
        assert_eq!(service.state(), ServiceState::Error);

        let messages: Vec<String> = context
            .log_archive()
            .entries()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert!(messages.contains(&"'failing-service' could not be started.".to_string()));
    }

    #[tokio::test]
    async fn test_stop_transitions_and_resets_subscribers() {
        let context = test_context();
        let service = ScriptedService::new(&context, "stoppable", true);
        service.start().await;

        let (handler, seen) = recorder();
        service.on_changes("panel", handler);
        assert_eq!(service.core().subscriber_count(), 1);

        let response = service.stop().await;

        assert!(response.is_ok());
        assert_eq!(service.state(), ServiceState::Stopped);
        assert_eq!(service.core().subscriber_count(), 0);
        // Replay at version 1, then the Stopped notification at version 2
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].0, 2);
        assert_eq!(seen[1].1, "State changed to 'Stopped'.");
        assert_eq!(seen[1].2, "stoppable");
    }

    #[tokio::test]
    async fn test_start_unresolved_hook_transitions_to_error() {
        let context = test_context();
        let service = ScriptedService::undecided(&context, "undecided-service");

        let response = service.start().await;

        assert_eq!(response.state, ResponseState::Unknown);
        assert_eq!(service.state(), ServiceState::Error);
    }

    #[tokio::test]
    async fn test_stop_unresolved_hook_transitions_to_error() {
        let context = test_context();
        let service = ScriptedService::undecided(&context, "undecided-service");

        service.stop().await;

        assert_eq!(service.state(), ServiceState::Error);
    }

    #[tokio::test]
    async fn test_start_resets_subscribers() {
        let context = test_context();
        let service = ScriptedService::new(&context, "restartable", true);
        let (handler, seen) = recorder();
        service.on_changes("early", handler);

        service.start().await;

        assert_eq!(service.core().subscriber_count(), 0);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_on_changes_replays_and_keys_are_unique() {
        let context = test_context();
        let service = ScriptedService::new(&context, "keys", true);
        service.core().update_version("warm up");

        let (handler, seen) = recorder();
        let first = service.on_changes("widget", handler.clone());
        let second = service.on_changes("widget", handler);

        assert_ne!(first, second);
        assert_eq!(first.as_str(), "widget_1");
        assert_eq!(second.as_str(), "widget_2");
        assert_eq!(seen.lock()[0], (1, "Subscription successfully".to_string(), "keys".to_string()));
    }

    #[test]
    fn test_versions_strictly_increase() {
        let context = test_context();
        let service = ScriptedService::new(&context, "versions", true);
        let (handler, seen) = recorder();
        service.on_changes("watcher", handler);

        service.core().mark_initialized();
        service.core().update_version("data changed");
        service.core().update_state(ServiceState::Running);

        let versions: Vec<u64> = seen.lock().iter().map(|(v, _, _)| *v).collect();
        assert_eq!(versions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_subscription_order_is_respected() {
        let context = test_context();
        let service = ScriptedService::new(&context, "ordered", true);
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            let order = order.clone();
            service.on_changes(
                name,
                Arc::new(move |version: u64, _: &str, _: &str| {
                    if version > 0 {
                        order.lock().push(name);
                    }
                }),
            );
        }

        service.core().update_version("broadcast");
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_off_changes() {
        let context = test_context();
        let service = ScriptedService::new(&context, "unsubscribe", true);
        let (first_handler, _) = recorder();
        let (second_handler, second_seen) = recorder();
        let first = service.on_changes("first", first_handler);
        let second = service.on_changes("second", second_handler);

        assert!(!service.off_changes(&SubscriptionKey::from("unknown_42")));
        assert_eq!(service.core().subscriber_count(), 2);

        assert!(service.off_changes(&first));
        assert_eq!(service.core().subscriber_count(), 1);

        service.core().update_version("after removal");
        assert_eq!(second_seen.lock().len(), 2);
        assert!(service.off_changes(&second));
    }

    #[tokio::test]
    async fn test_concurrent_transition_is_rejected() {
        let context = test_context();
        let service = ScriptedService::with_delay(&context, "slow", true, Duration::from_millis(50));

        let (first, second) = tokio::join!(service.start(), service.start());

        assert!(first.is_ok());
        assert!(second.is_error());
        assert_eq!(
            second.message_stack[0].display.key,
            "services.service.transitionpending"
        );
        assert_eq!(service.state(), ServiceState::Running);
        // Only the accepted start changed the version
        assert_eq!(service.version(), 1);

        // The guard is released once the transition completes
        assert!(service.stop().await.is_ok());
    }

    #[test]
    fn test_authentication_token_and_debug_mode() {
        let context = test_context();
        let service = ScriptedService::new(&context, "auth", true);
        assert!(service.core().authentication_token().is_none());

        service.set_authentication_token("secret");
        service.set_debug_mode(true);

        assert_eq!(service.core().authentication_token().as_deref(), Some("secret"));
        assert!(service.core().is_debug_mode());
        assert_eq!(service.display().key, "global.nodisplaydefined");
    }
}
