//! HTTP transport seam
//!
//! The REST service builds a [`TransportRequest`] and gets a
//! [`TransportReply`] back; everything between is the transport's business.
//! [`ReqwestTransport`] is the default implementation, tests plug in mocks.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    Cors,
    NoCors,
    #[default]
    SameOrigin,
    Navigate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestCache {
    #[default]
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

impl RequestCache {
    /// `Cache-Control` directive sent for this cache mode, if any
    pub fn cache_control(&self) -> Option<&'static str> {
        match self {
            RequestCache::NoStore => Some("no-store"),
            RequestCache::Reload | RequestCache::NoCache => Some("no-cache"),
            RequestCache::OnlyIfCached => Some("only-if-cached"),
            RequestCache::Default | RequestCache::ForceCache => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestCredentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestRedirect {
    #[default]
    Follow,
    Error,
    Manual,
}

/// Fetch-style request options
///
/// Mode, credentials and referrer only mean something to browser-like
/// transports; they are carried so such transports can honor them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub mode: RequestMode,
    pub cache: RequestCache,
    pub credentials: RequestCredentials,
    pub redirect: RequestRedirect,
    pub referrer: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            mode: RequestMode::default(),
            cache: RequestCache::default(),
            credentials: RequestCredentials::default(),
            redirect: RequestRedirect::default(),
            referrer: "client".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub options: RequestOptions,
}

impl TransportRequest {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Decoded reply body
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Absent,
    Json(Value),
    Text(String),
}

impl ReplyBody {
    /// Decode raw body text according to its content type
    ///
    /// An empty body is `Absent`; a JSON content type must carry valid JSON.
    pub fn from_text(content_type: Option<&str>, text: String) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(ReplyBody::Absent);
        }
        let is_json = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
        if is_json {
            Ok(ReplyBody::Json(serde_json::from_str(&text)?))
        } else {
            Ok(ReplyBody::Text(text))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportReply {
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: ReplyBody,
}

/// Sends one request and returns the decoded reply
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportReply>;
}

/// Transport backed by `reqwest`
#[derive(Clone)]
pub struct ReqwestTransport {
    following: reqwest::Client,
    manual: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let following = reqwest::Client::builder().timeout(timeout).build()?;
        let manual = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { following, manual })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportReply> {
        let client = match request.options.redirect {
            RequestRedirect::Follow => &self.following,
            RequestRedirect::Error | RequestRedirect::Manual => &self.manual,
        };
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(directive) = request.options.cache.cache_control() {
            builder = builder.header(CACHE_CONTROL, directive);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    url = request.url.as_str(),
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(e.into());
            }
        };

        let status = response.status();
        tracing::debug!(
            url = request.url.as_str(),
            status = status.as_u16(),
            "HTTP response received"
        );
        if request.options.redirect == RequestRedirect::Error && status.is_redirection() {
            return Err(Error::Transport {
                message: format!("Redirect refused for '{}' ({status})", request.url),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;

        Ok(TransportReply {
            ok: status.is_success(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: ReplyBody::from_text(content_type.as_deref(), text)?,
            content_type,
        })
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_body_from_text() {
        assert_eq!(
            ReplyBody::from_text(Some("application/json"), "  ".to_string()).expect("empty body"),
            ReplyBody::Absent
        );
        assert_eq!(
            ReplyBody::from_text(Some("application/json; charset=utf-8"), r#"{"a":1}"#.to_string())
                .expect("json body"),
            ReplyBody::Json(json!({"a": 1}))
        );
        assert_eq!(
            ReplyBody::from_text(Some("text/plain"), "hello".to_string()).expect("text body"),
            ReplyBody::Text("hello".to_string())
        );
        assert_eq!(
            ReplyBody::from_text(None, "hello".to_string()).expect("untyped body"),
            ReplyBody::Text("hello".to_string())
        );
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = ReplyBody::from_text(Some("application/json"), "{oops".to_string());
        assert!(matches!(result, Err(Error::Json { .. })));
    }

    #[test]
    fn test_request_option_defaults() {
        let options = RequestOptions::default();
        assert_eq!(options.mode, RequestMode::SameOrigin);
        assert_eq!(options.cache, RequestCache::Default);
        assert_eq!(options.credentials, RequestCredentials::SameOrigin);
        assert_eq!(options.redirect, RequestRedirect::Follow);
        assert_eq!(options.referrer, "client");
        assert_eq!(RequestCache::NoStore.cache_control(), Some("no-store"));
        assert_eq!(RequestCache::Default.cache_control(), None);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = TransportRequest {
            method: HttpMethod::Get,
            url: "/items".to_string(),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: None,
            options: RequestOptions::default(),
        };
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header("Authorization"), None);
    }
}
