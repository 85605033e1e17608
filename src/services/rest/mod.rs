//! REST Service
//!
//! Builds requests, hands them to an [`HttpTransport`] and normalizes
//! whatever comes back into a `Response` envelope.
//!
//! ```text
//! get/post/put/delete ──► TransportRequest ──► HttpTransport::send
//!                                                     │
//!        Response<T> ◄── decode ◄── normalize ◄── ReplyClass::classify
//! ```

mod normalizer;
mod transport;

pub use normalizer::*;
pub use transport::*;

use super::service::{Service, ServiceCore};
use crate::communication::Response;
use crate::constants::service_keys::REST_SERVICE;
use crate::context::RuntimeContext;
use crate::i18n::LocalizableText;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Request body; the variant decides the content type
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    /// Sent as `application/json`
    Json(Value),
    /// Sent verbatim as `application/x-www-form-urlencoded`
    Form(String),
}

impl RequestData {
    fn content_type(&self) -> &'static str {
        match self {
            RequestData::Json(_) => "application/json",
            RequestData::Form(_) => "application/x-www-form-urlencoded",
        }
    }

    fn to_body(&self) -> String {
        match self {
            RequestData::Json(value) => value.to_string(),
            RequestData::Form(text) => text.clone(),
        }
    }
}

impl From<Value> for RequestData {
    fn from(value: Value) -> Self {
        RequestData::Json(value)
    }
}

impl From<String> for RequestData {
    fn from(text: String) -> Self {
        RequestData::Form(text)
    }
}

impl From<&str> for RequestData {
    fn from(text: &str) -> Self {
        RequestData::Form(text.to_string())
    }
}

/// The request options a caller may change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOverrides {
    pub mode: Option<RequestMode>,
    pub credentials: Option<RequestCredentials>,
}

pub struct RestService {
    core: ServiceCore,
    transport: Arc<dyn HttpTransport>,
    authorization: RwLock<Option<String>>,
    base_url: Option<String>,
}

impl RestService {
    pub fn new(context: &RuntimeContext, transport: Arc<dyn HttpTransport>) -> Self {
        let core = ServiceCore::new(context, REST_SERVICE).with_display(
            LocalizableText::system("services.restservice.display", "REST Service"),
            LocalizableText::system(
                "services.restservice.description",
                "Provides all interaction options for REST communication.",
            ),
        );
        let service = Self {
            core,
            transport,
            authorization: RwLock::new(None),
            base_url: context.config().rest.base_url.clone(),
        };
        service.core.mark_initialized();
        service
    }

    /// Use `header` verbatim as the `Authorization` value
    pub fn set_authorization(&self, header: &str) {
        *self.authorization.write() = Some(header.to_string());
    }

    pub fn authorization(&self) -> Option<String> {
        self.authorization.read().clone()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        overrides: Option<RequestOverrides>,
    ) -> Response<T> {
        self.invoke_typed(HttpMethod::Get, url, None, overrides).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        data: impl Into<RequestData>,
        overrides: Option<RequestOverrides>,
    ) -> Response<T> {
        self.invoke_typed(HttpMethod::Post, url, Some(data.into()), overrides)
            .await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        url: &str,
        data: impl Into<RequestData>,
        overrides: Option<RequestOverrides>,
    ) -> Response<T> {
        self.invoke_typed(HttpMethod::Put, url, Some(data.into()), overrides)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        data: Option<RequestData>,
        overrides: Option<RequestOverrides>,
    ) -> Response<T> {
        self.invoke_typed(HttpMethod::Delete, url, data, overrides)
            .await
    }

    /// Send a request and return the normalized, undecoded envelope
    pub async fn invoke(
        &self,
        method: HttpMethod,
        url: &str,
        data: Option<RequestData>,
        overrides: Option<RequestOverrides>,
    ) -> Response<Value> {
        let request = self.build_request(method, url, data.as_ref(), overrides);
        let url = request.url.clone();
        self.trace(format!("REST request '{method}' has started on url {url}."));

        let reply = match self.transport.send(request).await {
            Ok(reply) => reply,
            Err(e) => {
                let log_text = format!("REST request '{method}' on url {url} failed: {e}");
                self.core.logger().error(log_text.as_str());
                return Response::error(system_message(
                    "services.restservice.requestfailed",
                    "The request could not be completed.",
                    self.core.key(),
                    log_text,
                ));
            }
        };

        self.trace(format!(
            "REST request '{method}' has returned on url {url}. [{}, {}]",
            reply.status, reply.status_text
        ));
        normalize(
            ReplyClass::classify(reply.body),
            self.core.key(),
            self.core.logger(),
        )
    }

    async fn invoke_typed<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        url: &str,
        data: Option<RequestData>,
        overrides: Option<RequestOverrides>,
    ) -> Response<T> {
        let response = self.invoke(method, url, data, overrides).await;
        decode_payload(response, self.core.key(), self.core.logger())
    }

    /// Assemble headers, body and options for one request
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        data: Option<&RequestData>,
        overrides: Option<RequestOverrides>,
    ) -> TransportRequest {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(authorization) = self.authorization() {
            headers.push(("Authorization".to_string(), authorization));
        }
        if let Some(data) = data {
            headers.push(("Content-Type".to_string(), data.content_type().to_string()));
        }

        let mut options = RequestOptions::default();
        if let Some(overrides) = overrides {
            options.mode = overrides.mode.unwrap_or(options.mode);
            options.credentials = overrides.credentials.unwrap_or(options.credentials);
        }

        TransportRequest {
            method,
            url: self.resolve_url(url),
            headers,
            body: data.map(RequestData::to_body),
            options,
        }
    }

    fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            _ => url.to_string(),
        }
    }

    fn trace(&self, message: String) {
        if self.core.is_debug_mode() {
            self.core.logger().info(message);
        } else {
            self.core.logger().debug(message);
        }
    }
}

#[async_trait]
impl Service for RestService {
    fn core(&self) -> &ServiceCore {
        &self.core
    }

    async fn on_starting(&self) -> Response<bool> {
        Response::ok(true)
    }

    async fn on_stopping(&self) -> Response<bool> {
        Response::ok(true)
    }

    /// Also sends the token as a bearer `Authorization` header
    fn set_authentication_token(&self, token: &str) {
        self.core.set_authentication_token(token);
        self.set_authorization(&format!("Bearer {token}"));
    }
}

impl fmt::Debug for RestService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestService")
            .field("core", &self.core)
            .field("base_url", &self.base_url)
            .field("authorized", &self.authorization.read().is_some())
            .finish()
    }
}
