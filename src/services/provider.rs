//! Service Provider
//!
//! Keyed registry of services with concurrent start/stop. Every lifecycle
//! call is bounded by the configured timeout; a timed-out or failed service
//! is counted, logged and left as it is. There is no rollback of services
//! that did succeed.

use super::service::Service;
use crate::constants::service_keys::SERVICE_PROVIDER;
use crate::context::RuntimeContext;
use crate::communication::{Response, ResponseMessage};
use crate::logging::Logger;
use futures::future::join_all;
use hashlink::LinkedHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one service's lifecycle call
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleOutcome {
    Succeeded,
    /// The hook answered with a non-OK envelope
    Failed(Vec<ResponseMessage>),
    TimedOut,
}

impl LifecycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LifecycleOutcome::Succeeded)
    }
}

/// Per-service outcomes of a start or stop fan-out, in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleReport {
    pub outcomes: Vec<(String, LifecycleOutcome)>,
}

impl LifecycleReport {
    /// True when no service failed or timed out
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .count()
    }

    pub fn outcome(&self, key: &str) -> Option<&LifecycleOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, outcome)| outcome)
    }

    /// Keys of the services that failed or timed out
    pub fn failed_keys(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

#[derive(Clone, Copy)]
enum Lifecycle {
    Start,
    Stop,
}

impl Lifecycle {
    fn verb(self) -> &'static str {
        match self {
            Lifecycle::Start => "started",
            Lifecycle::Stop => "stopped",
        }
    }
}

/// Registry and orchestrator of the runtime's services
pub struct ServiceProvider {
    services: RwLock<LinkedHashMap<String, Arc<dyn Service>>>,
    lifecycle_timeout: Duration,
    logger: Arc<Logger>,
}

impl ServiceProvider {
    pub fn new(context: &RuntimeContext) -> Self {
        Self {
            services: RwLock::new(LinkedHashMap::new()),
            lifecycle_timeout: context.config().services.lifecycle_timeout(),
            logger: context.logger(SERVICE_PROVIDER),
        }
    }

    /// Override the per-service lifecycle timeout
    pub fn with_lifecycle_timeout(mut self, timeout: Duration) -> Self {
        self.lifecycle_timeout = timeout;
        self
    }

    pub fn lifecycle_timeout(&self) -> Duration {
        self.lifecycle_timeout
    }

    /// Register a service; an already used key is rejected
    pub fn add_service(&self, service: Arc<dyn Service>, key: &str) -> bool {
        let mut services = self.services.write();
        if services.contains_key(key) {
            self.logger
                .error(format!("Service with key '{key}' is already registered."));
            return false;
        }

        services.insert(key.to_string(), service);
        self.logger
            .debug(format!("Service with key '{key}' has been added."));
        true
    }

    pub fn get_service(&self, key: &str) -> Option<Arc<dyn Service>> {
        let service = self.services.read().get(key).cloned();
        if service.is_none() {
            self.logger
                .warning(format!("Service with key '{key}' is not registered."));
        }
        service
    }

    /// Look up a service and downcast it to its concrete type
    pub fn get_service_as<T: Service + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let service = self.get_service(key)?;
        match service.into_any_arc().downcast::<T>() {
            Ok(service) => Some(service),
            Err(_) => {
                self.logger.error(format!(
                    "Service with key '{key}' is not of type '{}'.",
                    std::any::type_name::<T>()
                ));
                None
            }
        }
    }

    pub fn service_keys(&self) -> Vec<String> {
        self.services.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Start all services concurrently; true iff none failed
    pub async fn start_services(&self) -> bool {
        self.start_services_report().await.is_success()
    }

    /// Stop all services concurrently; true iff none failed
    pub async fn stop_services(&self) -> bool {
        self.stop_services_report().await.is_success()
    }

    pub async fn start_services_report(&self) -> LifecycleReport {
        self.run_lifecycle(Lifecycle::Start).await
    }

    pub async fn stop_services_report(&self) -> LifecycleReport {
        self.run_lifecycle(Lifecycle::Stop).await
    }

    /// Hand the token to every registered service
    pub fn set_authentication_token(&self, token: &str) {
        for service in self.snapshot().into_iter().map(|(_, service)| service) {
            service.set_authentication_token(token);
        }
    }

    fn snapshot(&self) -> Vec<(String, Arc<dyn Service>)> {
        self.services
            .read()
            .iter()
            .map(|(key, service)| (key.clone(), service.clone()))
            .collect()
    }

    async fn run_lifecycle(&self, lifecycle: Lifecycle) -> LifecycleReport {
        let timeout = self.lifecycle_timeout;
        let tasks = self.snapshot().into_iter().map(|(key, service)| async move {
            let call = async {
                match lifecycle {
                    Lifecycle::Start => service.start().await,
                    Lifecycle::Stop => service.stop().await,
                }
            };
            let outcome = match tokio::time::timeout(timeout, call).await {
                Ok(response) => Self::classify(response),
                Err(_) => LifecycleOutcome::TimedOut,
            };
            (key, outcome)
        });

        let report = LifecycleReport {
            outcomes: join_all(tasks).await,
        };

        for (key, outcome) in &report.outcomes {
            match outcome {
                LifecycleOutcome::Succeeded => {}
                LifecycleOutcome::Failed(_) => self
                    .logger
                    .error(format!("Service '{key}' could not be {}.", lifecycle.verb())),
                LifecycleOutcome::TimedOut => self.logger.error(format!(
                    "Service '{key}' was not {} within {} ms.",
                    lifecycle.verb(),
                    timeout.as_millis()
                )),
            }
        }

        let failures = report.failure_count();
        if failures > 0 {
            self.logger.error(format!(
                "'{failures}' services could not be {}.",
                lifecycle.verb()
            ));
        } else {
            self.logger.info(format!(
                "All '{}' services have been {}.",
                report.outcomes.len(),
                lifecycle.verb()
            ));
        }

        report
    }

    fn classify(response: Response<bool>) -> LifecycleOutcome {
        if response.is_ok() {
            LifecycleOutcome::Succeeded
        } else {
            LifecycleOutcome::Failed(response.message_stack)
        }
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.service_keys())
            .field("lifecycle_timeout", &self.lifecycle_timeout)
            .finish()
    }
}
