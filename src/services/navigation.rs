//! Navigation Service
//!
//! Turns "show this element" calls into [`NavigationRequest`] events for the
//! UI router and keeps a bounded, newest-first history of them.

use super::service::{Service, ServiceCore};
use crate::communication::Response;
use crate::constants::service_keys::NAVIGATION_SERVICE;
use crate::context::RuntimeContext;
use crate::domain::{NavigationElement, NavigationRequest, NavigationType};
use crate::eventing::{SubscriberMap, SubscriptionKey};
use crate::helpers::BoundedDeque;
use crate::i18n::LocalizableText;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Handler receiving each navigation request
pub type NavigationRequestHandler = dyn Fn(&NavigationRequest) + Send + Sync;

pub struct NavigationService {
    core: ServiceCore,
    subscribers: Mutex<SubscriberMap<NavigationRequestHandler>>,
    history: Mutex<BoundedDeque<NavigationRequest>>,
}

impl NavigationService {
    pub fn new(context: &RuntimeContext) -> Self {
        let core = ServiceCore::new(context, NAVIGATION_SERVICE).with_display(
            LocalizableText::system("services.navigationservice.display", "Navigation Service"),
            LocalizableText::system(
                "services.navigationservice.description",
                "Publishes navigation requests to the UI.",
            ),
        );
        let service = Self {
            core,
            subscribers: Mutex::new(SubscriberMap::new()),
            history: Mutex::new(BoundedDeque::new(
                context.config().navigation.history_capacity,
            )),
        };
        service.core.mark_initialized();
        service
    }

    /// Request the element to be shown; presented as a view unless it says otherwise
    pub fn show(&self, element: &NavigationElement, url: Option<String>) -> NavigationRequest {
        let navigation_type = element.navigation_type.unwrap_or_default();
        self.publish(NavigationRequest::new(element.key(), navigation_type, url))
    }

    pub fn show_view(&self, key: &str, url: Option<String>) -> NavigationRequest {
        self.publish(NavigationRequest::new(key, NavigationType::View, url))
    }

    pub fn show_dialog(&self, key: &str, url: Option<String>) -> NavigationRequest {
        self.publish(NavigationRequest::new(key, NavigationType::Dialog, url))
    }

    /// Subscribe to navigation requests; nothing is replayed
    pub fn on_navigation_request(
        &self,
        context_key: &str,
        handler: Arc<NavigationRequestHandler>,
    ) -> SubscriptionKey {
        let (key, count) = {
            let mut subscribers = self.subscribers.lock();
            let key = subscribers.insert(context_key, handler);
            (key, subscribers.len())
        };
        self.core.logger().debug(format!(
            "Component with key '{key}' has subscribed on 'NavigationRequest'."
        ));
        self.core
            .logger()
            .debug(format!("'{count}' subscribers on 'NavigationRequest'."));
        key
    }

    pub fn off_navigation_request(&self, key: &SubscriptionKey) -> bool {
        let (removed, count) = {
            let mut subscribers = self.subscribers.lock();
            (subscribers.remove(key), subscribers.len())
        };
        if removed {
            self.core.logger().debug(format!(
                "Component with key '{key}' has unsubscribed on 'NavigationRequest'."
            ));
        } else {
            self.core.logger().error(format!(
                "Component with key '{key}' not registered on 'NavigationRequest'."
            ));
        }
        self.core
            .logger()
            .debug(format!("'{count}' subscribers on 'NavigationRequest'."));
        removed
    }

    /// Requests newest first
    pub fn history(&self) -> Vec<NavigationRequest> {
        self.history.lock().to_vec()
    }

    pub fn history_capacity(&self) -> usize {
        self.history.lock().capacity()
    }

    fn publish(&self, request: NavigationRequest) -> NavigationRequest {
        let handlers = self.subscribers.lock().snapshot();
        for handler in handlers {
            handler(&request);
        }

        self.history.lock().push(request.clone());
        self.core.update_version(format!(
            "Navigation requested has been added [{}, {}]",
            request.key, request.navigation_type
        ));
        request
    }
}

#[async_trait]
impl Service for NavigationService {
    fn core(&self) -> &ServiceCore {
        &self.core
    }

    async fn on_starting(&self) -> Response<bool> {
        Response::ok(true)
    }

    async fn on_stopping(&self) -> Response<bool> {
        Response::ok(true)
    }
}

impl fmt::Debug for NavigationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationService")
            .field("core", &self.core)
            .field("subscribers", &self.subscribers.lock().len())
            .field("history", &self.history.lock().len())
            .finish()
    }
}
