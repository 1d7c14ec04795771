//! JSON messages exchanged with the remote peer.
//!
//! Every message is a JSON object with a `"type"` discriminant; the payload
//! fields are flattened into the same object:
//!
//! ```json
//! {"type":"Keystroke","request_id":7,"metaLeft":false,"metaRight":false,
//!  "altLeft":false,"altRight":false,"shiftLeft":true,"shiftRight":false,
//!  "ctrlLeft":false,"ctrlRight":false,"key":"A","code":"KeyA"}
//! {"type":"KeyRelease"}
//! {"type":"Pointer","request_id":8,"buttons":1,"relativeX":0.5,"relativeY":0.25,
//!  "verticalWheelDelta":0,"horizontalWheelDelta":0}
//! {"type":"Ack","request_id":7,"success":true}
//! ```
//!
//! Outbound and inbound directions are separate enums so that sending a
//! peer-only message is a compile-time error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::events::{KeystrokeEvent, PointerEvent};

/// Error raised when a frame cannot be encoded or decoded.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JSON frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Messages the relay sends to the peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// A key press with its asserted modifiers.  Acknowledged.
    Keystroke {
        request_id: u64,
        #[serde(flatten)]
        event: KeystrokeEvent,
    },
    /// All keys should be considered released.  Not acknowledged.
    KeyRelease,
    /// A pointer move, button transition, or wheel step.  Acknowledged.
    Pointer {
        request_id: u64,
        #[serde(flatten)]
        event: PointerEvent,
    },
}

impl OutboundMessage {
    /// The correlation id, for messages that expect an acknowledgement.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            OutboundMessage::Keystroke { request_id, .. }
            | OutboundMessage::Pointer { request_id, .. } => Some(*request_id),
            OutboundMessage::KeyRelease => None,
        }
    }

    /// Encodes this message as a JSON text frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages the peer sends back to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// Outcome of the request with the matching id.
    Ack { request_id: u64, success: bool },
}

impl InboundMessage {
    /// Decodes a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::CanonicalCode;

    #[test]
    fn test_keystroke_frame_is_flat_and_tagged() {
        // Arrange
        let msg = OutboundMessage::Keystroke {
            request_id: 7,
            event: KeystrokeEvent::new(
                "A",
                CanonicalCode::from_static("KeyA"),
                [CanonicalCode::SHIFT_LEFT].iter(),
            ),
        };

        // Act
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        // Assert
        assert_eq!(value["type"], "Keystroke");
        assert_eq!(value["request_id"], 7);
        assert_eq!(value["shiftLeft"], true);
        assert_eq!(value["code"], "KeyA");
        assert_eq!(value["key"], "A");
    }

    #[test]
    fn test_key_release_frame_has_only_type() {
        let json = OutboundMessage::KeyRelease.to_json().unwrap();
        assert_eq!(json, r#"{"type":"KeyRelease"}"#);
        assert_eq!(OutboundMessage::KeyRelease.request_id(), None);
    }

    #[test]
    fn test_pointer_frame_uses_camel_case_fields() {
        let msg = OutboundMessage::Pointer {
            request_id: 3,
            event: PointerEvent {
                buttons: 2,
                relative_x: 0.5,
                relative_y: 0.75,
                vertical_wheel_delta: -1,
                horizontal_wheel_delta: 0,
            },
        };

        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "Pointer");
        assert_eq!(value["relativeY"], 0.75);
        assert_eq!(value["verticalWheelDelta"], -1);
        assert_eq!(msg.request_id(), Some(3));
    }

    #[test]
    fn test_ack_frame_decodes() {
        let ack = InboundMessage::from_json(r#"{"type":"Ack","request_id":12,"success":false}"#)
            .unwrap();
        assert_eq!(
            ack,
            InboundMessage::Ack {
                request_id: 12,
                success: false
            }
        );
    }

    #[test]
    fn test_unknown_inbound_type_is_rejected() {
        assert!(InboundMessage::from_json(r#"{"type":"Video","frame":1}"#).is_err());
        assert!(InboundMessage::from_json("not json").is_err());
    }
}
