//! Response Envelope
//!
//! Uniform success/failure wrapper returned by every asynchronous operation.
//!
//! An `Ok` envelope means the operation's effect occurred. An `Error`
//! envelope always carries at least one [`ResponseMessage`] explaining why.
//! `Unknown` is only the starting value while a reply is being interpreted
//! and must not be returned from a completed operation.

use crate::i18n::LocalizableText;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Outcome of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseState {
    #[default]
    Unknown,
    Ok,
    Error,
}

impl ResponseState {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseState::Unknown => "Unknown",
            ResponseState::Ok => "OK",
            ResponseState::Error => "Error",
        }
    }

    /// Numeric code used by older servers
    pub fn code(&self) -> u8 {
        match self {
            ResponseState::Unknown => 0,
            ResponseState::Ok => 1,
            ResponseState::Error => 2,
        }
    }
}

impl fmt::Display for ResponseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResponseState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResponseState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(0) => Ok(ResponseState::Unknown),
            Repr::Code(1) => Ok(ResponseState::Ok),
            Repr::Code(2) => Ok(ResponseState::Error),
            Repr::Code(other) => Err(de::Error::custom(format!(
                "unknown response state code {other}"
            ))),
            Repr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "unknown" => Ok(ResponseState::Unknown),
                "ok" => Ok(ResponseState::Ok),
                "error" => Ok(ResponseState::Error),
                _ => Err(de::Error::custom(format!("unknown response state '{name}'"))),
            },
        }
    }
}

/// A single explanatory message attached to a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    /// Text shown to the user
    pub display: LocalizableText,
    /// Component that produced the message
    #[serde(default)]
    pub context: String,
    /// Diagnostic text for the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_text: Option<String>,
}

impl ResponseMessage {
    pub fn new(display: LocalizableText, context: impl Into<String>) -> Self {
        Self {
            display,
            context: context.into(),
            log_text: None,
        }
    }

    pub fn with_log_text(mut self, log_text: impl Into<String>) -> Self {
        self.log_text = Some(log_text.into());
        self
    }
}

/// The response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub state: ResponseState,
    #[serde(default)]
    pub message_stack: Vec<ResponseMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T> Response<T> {
    /// Build an envelope from its parts
    pub fn new(payload: Option<T>, state: ResponseState, message_stack: Vec<ResponseMessage>) -> Self {
        Self {
            state,
            message_stack,
            payload,
        }
    }

    /// Successful envelope carrying `payload`
    pub fn ok(payload: T) -> Self {
        Self::new(Some(payload), ResponseState::Ok, Vec::new())
    }

    /// Failed envelope with a single explanatory message
    pub fn error(message: ResponseMessage) -> Self {
        Self::new(None, ResponseState::Error, vec![message])
    }

    /// Starting value while a reply is still being interpreted
    pub fn unknown() -> Self {
        Self::new(None, ResponseState::Unknown, Vec::new())
    }

    pub fn is_ok(&self) -> bool {
        self.state == ResponseState::Ok
    }

    pub fn is_error(&self) -> bool {
        self.state == ResponseState::Error
    }

    /// Append a message, keeping state and payload
    pub fn push_message(&mut self, message: ResponseMessage) {
        self.message_stack.push(message);
    }
}

impl<T> Default for Response<T> {
    fn default() -> Self {
        Self::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message() -> ResponseMessage {
        ResponseMessage::new(LocalizableText::system("test.failed", "Failed."), "test")
            .with_log_text("Failed for testing.")
    }

    #[test]
    fn test_ok_defaults() {
        let response = Response::ok(true);
        assert_eq!(response.state, ResponseState::Ok);
        assert!(response.message_stack.is_empty());
        assert_eq!(response.payload, Some(true));
    }

    #[test]
    fn test_error_has_message() {
        let response: Response<bool> = Response::error(message());
        assert!(response.is_error());
        assert_eq!(response.message_stack.len(), 1);
        assert!(response.payload.is_none());
    }

    #[test]
    fn test_state_accepts_names_and_codes() {
        let by_name: ResponseState = serde_json::from_value(json!("OK")).expect("name");
        let lower: ResponseState = serde_json::from_value(json!("error")).expect("lower");
        let by_code: ResponseState = serde_json::from_value(json!(2)).expect("code");
        assert_eq!(by_name, ResponseState::Ok);
        assert_eq!(lower, ResponseState::Error);
        assert_eq!(by_code, ResponseState::Error);
        assert!(serde_json::from_value::<ResponseState>(json!(7)).is_err());
        assert!(serde_json::from_value::<ResponseState>(json!("maybe")).is_err());
    }

    #[test]
    fn test_wire_shape() {
        let response: Response<bool> = Response::error(message());
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["state"], "Error");
        assert_eq!(value["messageStack"][0]["logText"], "Failed for testing.");
        assert!(value.get("payload").is_none());

        let back: Response<bool> = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, response);
    }

    #[test]
    fn test_message_without_context_reads() {
        let message: ResponseMessage =
            serde_json::from_value(json!({"display": {"key": "srv.fail", "value": "Failed"}}))
                .expect("message");
        assert_eq!(message.display.key, "srv.fail");
        assert!(message.context.is_empty());
        assert!(message.log_text.is_none());
    }
}
