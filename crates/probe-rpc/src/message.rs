//! Wire message shapes for the duplex protocol channel.
//!
//! Three JSON object forms travel the channel: outbound requests, and
//! inbound responses and events. Responses and events share the stream and
//! are distinguished by the presence of an `id` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

/// Outbound command invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request identifier; monotonically assigned, never reused.
    pub id: u64,
    /// Qualified method name, `<domain>.<command>`.
    pub method: String,
    /// Command parameters; absent for parameterless commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Inbound reply to a request, matched by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

/// Protocol-level error carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// Inbound unsolicited notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Qualified event name, `<domain>.<event>`.
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Either inbound shape.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    Response(Response),
    Event(EventMessage),
}

impl InboundMessage {
    /// Classifies one inbound frame.
    ///
    /// A JSON object with an `id` field is a response; without `id` but
    /// with a `method` it is an event. Anything else is malformed and
    /// kills the reader loop.
    pub fn parse(text: &str) -> Result<Self, RpcError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| RpcError::MalformedMessage(err.to_string()))?;

        let Some(object) = value.as_object() else {
            return Err(RpcError::MalformedMessage(format!(
                "expected a JSON object, got: {value}"
            )));
        };

        if object.contains_key("id") {
            let response = serde_json::from_value(value)
                .map_err(|err| RpcError::MalformedMessage(err.to_string()))?;
            Ok(Self::Response(response))
        } else if object.contains_key("method") {
            let event = serde_json::from_value(value)
                .map_err(|err| RpcError::MalformedMessage(err.to_string()))?;
            Ok(Self::Event(event))
        } else {
            Err(RpcError::MalformedMessage(format!(
                "message is neither a response nor an event: {value}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_is_recognized_by_id() {
        let msg = InboundMessage::parse(r#"{"id": 3, "result": {"ok": true}}"#).unwrap();
        let InboundMessage::Response(response) = msg else {
            panic!("expected a response");
        };
        assert_eq!(response.id, 3);
        assert!(response.error.is_none());
    }

    #[test]
    fn error_response_keeps_code_and_message() {
        let msg =
            InboundMessage::parse(r#"{"id": 0, "error": {"code": -1, "message": "boom"}}"#)
                .unwrap();
        let InboundMessage::Response(response) = msg else {
            panic!("expected a response");
        };
        let error = response.error.unwrap();
        assert_eq!(error.code, -1);
        assert_eq!(error.message, "boom");
    }

    #[test]
    fn event_is_recognized_by_missing_id() {
        let msg =
            InboundMessage::parse(r#"{"method": "Page.loadEventFired", "params": {"timestamp": 1.5}}"#)
                .unwrap();
        let InboundMessage::Event(event) = msg else {
            panic!("expected an event");
        };
        assert_eq!(event.method, "Page.loadEventFired");
    }

    #[test]
    fn payload_free_event_parses() {
        let msg = InboundMessage::parse(r#"{"method": "Page.interstitialHidden"}"#).unwrap();
        let InboundMessage::Event(event) = msg else {
            panic!("expected an event");
        };
        assert!(event.params.is_none());
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(InboundMessage::parse("not json").is_err());
        assert!(InboundMessage::parse("[1, 2, 3]").is_err());
        assert!(InboundMessage::parse(r#"{"neither": true}"#).is_err());
    }

    #[test]
    fn request_omits_absent_params() {
        let request = Request {
            id: 7,
            method: "Page.enable".into(),
            params: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"id":7,"method":"Page.enable"}"#);
    }
}
