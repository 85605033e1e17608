//! Response normalization
//!
//! Servers answer with envelopes, bare objects, strings or nothing at all.
//! Each reply body is classified once into a [`ReplyClass`] and then turned
//! into the canonical `Response<Value>`:
//!
//! | class         | source body                                   | result                      |
//! |---------------|-----------------------------------------------|-----------------------------|
//! | `Empty`       | absent, JSON `null`                           | Error `novalidresponse`     |
//! | `Text`        | text body, JSON string                        | OK `{"data": text}`         |
//! | `Envelope`    | object with `state`, `messageStack`, `payload`| passed through (see below)  |
//! | `Opaque`      | any other object or array                     | OK, value as payload        |
//! | `Unsupported` | number, boolean                               | Error `noresponse`          |
//!
//! An envelope keeps the server's state, messages and payload. Parts that
//! cannot be read never turn into success: an unrecognized state or an
//! `Unknown` one becomes `Error`, and unreadable stack entries are replaced
//! by system messages.

use super::transport::ReplyBody;
use crate::communication::{Response, ResponseMessage, ResponseState};
use crate::i18n::LocalizableText;
use crate::logging::Logger;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

const ENVELOPE_KEYS: [&str; 3] = ["state", "messageStack", "payload"];

/// Shape of a reply body
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyClass {
    Empty,
    Text(String),
    Envelope(WireEnvelope),
    Opaque(Value),
    Unsupported(Value),
}

impl ReplyClass {
    pub fn classify(body: ReplyBody) -> Self {
        match body {
            ReplyBody::Absent | ReplyBody::Json(Value::Null) => ReplyClass::Empty,
            ReplyBody::Text(text) | ReplyBody::Json(Value::String(text)) => ReplyClass::Text(text),
            ReplyBody::Json(Value::Object(map)) => Self::classify_object(map),
            ReplyBody::Json(value @ Value::Array(_)) => ReplyClass::Opaque(value),
            ReplyBody::Json(value) => ReplyClass::Unsupported(value),
        }
    }

    fn classify_object(map: Map<String, Value>) -> Self {
        let is_envelope = ENVELOPE_KEYS
            .iter()
            .all(|key| map.get(*key).is_some_and(|value| !value.is_null()));
        if is_envelope {
            ReplyClass::Envelope(WireEnvelope::read(map))
        } else {
            ReplyClass::Opaque(Value::Object(map))
        }
    }
}

/// Envelope fields as sent by the server
///
/// Reading never fails. A state that is no known name or code is `None`;
/// stack entries that are not messages are kept raw.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEnvelope {
    pub state: Option<ResponseState>,
    pub raw_state: Value,
    pub message_stack: Vec<ResponseMessage>,
    pub unreadable_messages: Vec<Value>,
    pub payload: Value,
}

impl WireEnvelope {
    fn read(mut map: Map<String, Value>) -> Self {
        let raw_state = map.remove("state").unwrap_or_default();
        let state = ResponseState::deserialize(&raw_state).ok();
        let entries = match map.remove("messageStack") {
            Some(Value::Array(entries)) => entries,
            Some(other) => vec![other],
            None => Vec::new(),
        };

        let mut message_stack = Vec::with_capacity(entries.len());
        let mut unreadable_messages = Vec::new();
        for entry in entries {
            match ResponseMessage::deserialize(&entry) {
                Ok(message) => message_stack.push(message),
                Err(_) => unreadable_messages.push(entry),
            }
        }

        Self {
            state,
            raw_state,
            message_stack,
            unreadable_messages,
            payload: map.remove("payload").unwrap_or_default(),
        }
    }
}

/// Build a system-namespace message for `context`
pub(crate) fn system_message(
    key: &str,
    value: &str,
    context: &str,
    log_text: impl Into<String>,
) -> ResponseMessage {
    ResponseMessage::new(LocalizableText::system(key, value), context).with_log_text(log_text)
}

/// Turn a classified reply into the canonical envelope
pub fn normalize(class: ReplyClass, context: &str, logger: &Logger) -> Response<Value> {
    match class {
        ReplyClass::Empty => {
            let log_text = "No valid response. Response object is null or undefined.";
            logger.error(log_text);
            Response::error(system_message(
                "services.restservice.novalidresponse",
                "No valid response.",
                context,
                log_text,
            ))
        }
        ReplyClass::Text(text) => Response::ok(json!({ "data": text })),
        ReplyClass::Envelope(envelope) => resolve_envelope(envelope, context, logger),
        ReplyClass::Opaque(value) => Response::ok(value),
        ReplyClass::Unsupported(value) => {
            let log_text = format!("No response available. Unexpected reply body '{value}'.");
            logger.error(log_text.as_str());
            Response::error(system_message(
                "services.restservice.noresponse",
                "No response available.",
                context,
                log_text,
            ))
        }
    }
}

fn resolve_envelope(envelope: WireEnvelope, context: &str, logger: &Logger) -> Response<Value> {
    let WireEnvelope {
        state,
        raw_state,
        message_stack,
        unreadable_messages,
        payload,
    } = envelope;
    let mut response = Response::new(
        Some(payload),
        state.unwrap_or(ResponseState::Error),
        message_stack,
    );

    for entry in unreadable_messages {
        let log_text = format!("Unreadable message in response envelope: {entry}");
        logger.warning(log_text.as_str());
        response.push_message(system_message(
            "services.restservice.unreadablemessage",
            "The server sent a message that could not be read.",
            context,
            log_text,
        ));
    }

    match state {
        None => {
            let log_text = format!("Response envelope has an unrecognized state {raw_state}.");
            logger.error(log_text.as_str());
            response.push_message(system_message(
                "services.restservice.invalidstate",
                "The response state could not be read.",
                context,
                log_text,
            ));
        }
        Some(ResponseState::Unknown) => {
            let log_text = "Response envelope did not report an outcome.";
            logger.error(log_text);
            response.state = ResponseState::Error;
            response.push_message(system_message(
                "services.restservice.unresolvedstate",
                "The server did not report an outcome.",
                context,
                log_text,
            ));
        }
        Some(ResponseState::Error) if response.message_stack.is_empty() => {
            let log_text = "Response envelope reported an error without messages.";
            logger.error(log_text);
            response.push_message(system_message(
                "services.restservice.servererror",
                "The server reported an error.",
                context,
                log_text,
            ));
        }
        Some(_) => {}
    }
    response
}

/// Decode the JSON payload of a normalized envelope into `T`
///
/// State and messages are kept; a payload that does not fit `T` turns the
/// envelope into an error.
pub fn decode_payload<T: DeserializeOwned>(
    response: Response<Value>,
    context: &str,
    logger: &Logger,
) -> Response<T> {
    let Response {
        state,
        mut message_stack,
        payload,
    } = response;

    match payload.map(serde_json::from_value::<T>).transpose() {
        Ok(payload) => Response::new(payload, state, message_stack),
        Err(e) => {
            let log_text = format!(
                "Payload does not match the expected type '{}': {e}",
                std::any::type_name::<T>()
            );
            logger.error(log_text.as_str());
            message_stack.push(system_message(
                "services.restservice.payloadmismatch",
                "The response payload has an unexpected format.",
                context,
                log_text,
            ));
            Response::new(None, ResponseState::Error, message_stack)
        }
    }
}
