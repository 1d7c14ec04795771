//! Input sources: where raw operator input enters the relay.
//!
//! The headless binary reads newline-delimited JSON from stdin
//! ([`stdin::JsonLinesInputSource`]); an embedding UI would provide its own
//! [`InputSource`].  Tests inject events through [`mock::MockInputSource`].
//!
//! # Wire shape
//!
//! One JSON object per line, tagged by `"type"`:
//!
//! ```json
//! {"type":"KeyDown","code":"KeyA","key":"a","key_code":65,"modifiers":{"shift":false}}
//! {"type":"PointerMove","client_x":120,"client_y":40,"target":{"left":0,"top":0,"width":1280,"height":720}}
//! {"type":"TouchStart","touches":[{"client_x":10,"client_y":20}],"target":{"left":0,"top":0,"width":1280,"height":720}}
//! {"type":"Paste","text":"hello"}
//! {"type":"Blur"}
//! ```

use relay_core::{BoundingRect, RawKeyEvent, RawPointerEvent, TouchPoint};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

pub mod mock;
pub mod stdin;

/// A raw input event, before any normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawInputEvent {
    /// A key was pressed (or auto-repeated).
    KeyDown(RawKeyEvent),
    /// A key was released.
    KeyUp(RawKeyEvent),
    /// A mouse button was pressed over the target surface.
    PointerDown(RawPointerEvent),
    /// A mouse button was released.
    PointerUp(RawPointerEvent),
    /// The pointer moved.
    PointerMove(RawPointerEvent),
    /// The wheel turned.
    Wheel(RawPointerEvent),
    /// A touch sequence began.  `touches[0]` is the primary touch.
    TouchStart {
        touches: Vec<TouchPoint>,
        target: BoundingRect,
    },
    /// Active touches moved.
    TouchMove { touches: Vec<TouchPoint> },
    /// The last finger lifted.
    TouchEnd,
    /// The environment aborted the touch sequence.
    TouchCancel,
    /// The input surface lost focus; held keys will never report release.
    Blur,
    /// The operator pasted text to be typed on the remote machine.
    Paste { text: String },
}

/// Error type for input sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("input source already started")]
    AlreadyStarted,
    #[error("input I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait abstracting where raw input comes from.
pub trait InputSource: Send + Sync {
    /// Starts producing events; they arrive on the returned channel.
    ///
    /// The channel closes when the source is exhausted or stopped.
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RawInputEvent>, SourceError>;

    /// Stops producing events.
    fn stop(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_decodes_from_flat_json() {
        // Arrange
        let line = r#"{"type":"KeyDown","code":"KeyA","key":"a","key_code":65,"modifiers":{"shift":true}}"#;

        // Act
        let event: RawInputEvent = serde_json::from_str(line).unwrap();

        // Assert
        match event {
            RawInputEvent::KeyDown(raw) => {
                assert_eq!(raw.code, "KeyA");
                assert_eq!(raw.key_code, 65);
                assert!(raw.modifiers.shift);
                assert!(!raw.modifiers.ctrl);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_unit_variants_decode() {
        let blur: RawInputEvent = serde_json::from_str(r#"{"type":"Blur"}"#).unwrap();
        let end: RawInputEvent = serde_json::from_str(r#"{"type":"TouchEnd"}"#).unwrap();
        assert_eq!(blur, RawInputEvent::Blur);
        assert_eq!(end, RawInputEvent::TouchEnd);
    }

    #[test]
    fn test_touch_start_decodes_touch_list() {
        let line = r#"{"type":"TouchStart","touches":[{"client_x":1,"client_y":2},{"client_x":3,"client_y":4}],"target":{"left":0,"top":0,"width":10,"height":10}}"#;

        let event: RawInputEvent = serde_json::from_str(line).unwrap();

        match event {
            RawInputEvent::TouchStart { touches, target } => {
                assert_eq!(touches.len(), 2);
                assert_eq!(target.width, 10.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
