use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messaging::FirebaseConfig;
use crate::worker::error::{invalid_message, WorkerResult};
use crate::worker::logger::LOGGER;

pub const FIREBASE_CONFIG_MESSAGE: &str = "FIREBASE_CONFIG";
pub const SKIP_WAITING_MESSAGE: &str = "SKIP_WAITING";

/// Messages pages post to the worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "FIREBASE_CONFIG")]
    FirebaseConfig { config: FirebaseConfig },
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

impl ClientMessage {
    /// Decodes a posted message.
    ///
    /// Returns `Ok(None)` for anything without a recognised `type`, since pages and
    /// libraries share the channel. A recognised type with a malformed body is an error.
    pub fn parse(data: &Value) -> WorkerResult<Option<Self>> {
        let kind = data.get("type").and_then(Value::as_str);
        match kind {
            Some(name @ (FIREBASE_CONFIG_MESSAGE | SKIP_WAITING_MESSAGE)) => {
                serde_json::from_value(data.clone())
                    .map(Some)
                    .map_err(|err| invalid_message(format!("malformed {name} message: {err}")))
            }
            _ => {
                LOGGER.debug(format!("ignoring message with type {kind:?}"));
                Ok(None)
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// What handling a posted message did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    Ignored,
    /// A config was handed to the messaging bridge; carries whether a client now exists.
    ConfigApplied { messaging_ready: bool },
    SkippedWaiting,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_firebase_config() {
        let message = ClientMessage::parse(&json!({
            "type": "FIREBASE_CONFIG",
            "config": {"projectId": "cool-track", "messagingSenderId": "42"}
        }))
        .unwrap()
        .unwrap();
        match message {
            ClientMessage::FirebaseConfig { config } => {
                assert_eq!(config.project_id.as_deref(), Some("cool-track"))
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn skip_waiting_serializes_like_pages_send_it() {
        assert_eq!(
            ClientMessage::SkipWaiting.to_value(),
            json!({"type": "SKIP_WAITING"})
        );
        assert_eq!(
            ClientMessage::parse(&json!({"type": "SKIP_WAITING"})).unwrap(),
            Some(ClientMessage::SkipWaiting)
        );
    }

    #[test]
    fn unknown_and_untyped_messages_are_ignored() {
        assert_eq!(ClientMessage::parse(&json!({"type": "PING"})).unwrap(), None);
        assert_eq!(ClientMessage::parse(&json!("hello")).unwrap(), None);
        assert_eq!(ClientMessage::parse(&Value::Null).unwrap(), None);
    }

    #[test]
    fn malformed_known_message_is_an_error() {
        assert!(ClientMessage::parse(&json!({"type": "FIREBASE_CONFIG"})).is_err());
    }
}
