//! Input-event value objects.
//!
//! Two kinds of types live here:
//!
//! - **Raw descriptors** ([`RawKeyEvent`], [`RawPointerEvent`], [`TouchPoint`])
//!   mirror what the local environment reports, quirks included.
//! - **Normalized events** ([`KeystrokeEvent`], [`PointerEvent`]) are what the
//!   transport carries to the remote peer.  Their serde representation is the
//!   serialization contract with the peer, so field names are camelCase.

use serde::{Deserialize, Serialize};

use crate::keymap::{CanonicalCode, ModifierFamily};

/// Raw key-code value browsers report for IME composition events.
///
/// These events cannot be mapped to a physical key and are dropped.
pub const IME_COMPOSITION_KEY_CODE: u32 = 229;

/// Mouse button bits used in [`PointerEvent::buttons`].
pub mod buttons {
    pub const NONE: u8 = 0;
    pub const PRIMARY: u8 = 1 << 0;
    pub const SECONDARY: u8 = 1 << 1;
    pub const MIDDLE: u8 = 1 << 2;
}

// ── Keyboard ──────────────────────────────────────────────────────────────────

/// Aggregate modifier flags reported on a single raw event.
///
/// The environment says *whether* a family is held, not *which side*.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSnapshot {
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
}

impl ModifierSnapshot {
    /// Returns whether `family` is reported as held.
    pub fn is_asserted(&self, family: ModifierFamily) -> bool {
        match family {
            ModifierFamily::Alt => self.alt,
            ModifierFamily::Meta => self.meta,
            ModifierFamily::Control => self.ctrl,
            ModifierFamily::Shift => self.shift,
        }
    }
}

/// A keyboard event as reported by the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKeyEvent {
    /// Physical key name (`KeyboardEvent.code`); may be empty or legacy.
    #[serde(default)]
    pub code: String,
    /// Display label (`KeyboardEvent.key`), e.g. `"a"`, `"Shift"`, `"Alt"`.
    #[serde(default)]
    pub key: String,
    /// Legacy numeric key code; `229` marks IME composition.
    #[serde(default)]
    pub key_code: u32,
    /// Modifier flags carried by this event.
    #[serde(default)]
    pub modifiers: ModifierSnapshot,
}

impl RawKeyEvent {
    /// Returns `true` for IME composition placeholder events.
    pub fn is_ime_placeholder(&self) -> bool {
        self.key_code == IME_COMPOSITION_KEY_CODE
    }
}

/// A normalized keystroke, ready for the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystrokeEvent {
    pub meta_left: bool,
    pub meta_right: bool,
    pub alt_left: bool,
    pub alt_right: bool,
    pub shift_left: bool,
    pub shift_right: bool,
    pub ctrl_left: bool,
    pub ctrl_right: bool,
    /// Display label for history views.
    pub key: String,
    /// Physical key being pressed.
    pub code: CanonicalCode,
}

impl KeystrokeEvent {
    /// Builds a keystroke for `code`, asserting every modifier in `pressed`.
    ///
    /// Non-modifier codes in `pressed` are ignored.
    pub fn new<'a>(
        key: impl Into<String>,
        code: CanonicalCode,
        pressed: impl IntoIterator<Item = &'a CanonicalCode>,
    ) -> Self {
        let mut event = KeystrokeEvent {
            key: key.into(),
            code,
            ..Default::default()
        };
        for modifier in pressed {
            match modifier.as_str() {
                "MetaLeft" => event.meta_left = true,
                "MetaRight" => event.meta_right = true,
                "AltLeft" => event.alt_left = true,
                "AltRight" => event.alt_right = true,
                "ShiftLeft" => event.shift_left = true,
                "ShiftRight" => event.shift_right = true,
                "ControlLeft" => event.ctrl_left = true,
                "ControlRight" => event.ctrl_right = true,
                _ => {}
            }
        }
        event
    }

    /// Codes of all asserted modifiers, in a fixed order.
    pub fn asserted_modifiers(&self) -> Vec<CanonicalCode> {
        [
            (self.meta_left, CanonicalCode::META_LEFT),
            (self.meta_right, CanonicalCode::META_RIGHT),
            (self.alt_left, CanonicalCode::ALT_LEFT),
            (self.alt_right, CanonicalCode::ALT_RIGHT),
            (self.shift_left, CanonicalCode::SHIFT_LEFT),
            (self.shift_right, CanonicalCode::SHIFT_RIGHT),
            (self.ctrl_left, CanonicalCode::CONTROL_LEFT),
            (self.ctrl_right, CanonicalCode::CONTROL_RIGHT),
        ]
        .into_iter()
        .filter_map(|(asserted, code)| asserted.then_some(code))
        .collect()
    }
}

// ── Pointer ───────────────────────────────────────────────────────────────────

/// Bounding box of the surface the pointer interacts with, in client pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A mouse or wheel event as reported by the environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPointerEvent {
    pub client_x: f64,
    pub client_y: f64,
    pub target: BoundingRect,
    /// Bitmask of currently held buttons (see [`buttons`]).
    #[serde(default)]
    pub buttons: u8,
    /// Horizontal wheel delta; positive scrolls right.
    #[serde(default)]
    pub delta_x: f64,
    /// Vertical wheel delta; positive scrolls the content down.
    #[serde(default)]
    pub delta_y: f64,
}

/// A normalized pointer event, ready for the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    pub buttons: u8,
    /// Horizontal position within the target, `0.0..=1.0`.
    pub relative_x: f64,
    /// Vertical position within the target, `0.0..=1.0`.
    pub relative_y: f64,
    /// `-1`, `0` or `1`; negative means "scroll down".
    pub vertical_wheel_delta: i8,
    /// `-1`, `0` or `1`.
    pub horizontal_wheel_delta: i8,
}

fn relative_position(offset: f64, extent: f64) -> f64 {
    if extent <= 0.0 || !offset.is_finite() {
        return 0.0;
    }
    (offset / extent).clamp(0.0, 1.0)
}

fn unit_delta(delta: f64) -> i8 {
    if delta > 0.0 {
        1
    } else if delta < 0.0 {
        -1
    } else {
        0
    }
}

/// Normalizes a raw pointer event.
///
/// Coordinates become fractions of the target's bounding box, clamped to
/// `[0, 1]`.  Wheel deltas collapse to their sign; the vertical one is
/// negated so that negative means "scroll down".
pub fn parse_pointer_event(raw: &RawPointerEvent) -> PointerEvent {
    PointerEvent {
        buttons: raw.buttons,
        relative_x: relative_position(raw.client_x - raw.target.left, raw.target.width),
        relative_y: relative_position(raw.client_y - raw.target.top, raw.target.height),
        vertical_wheel_delta: -unit_delta(raw.delta_y),
        horizontal_wheel_delta: unit_delta(raw.delta_x),
    }
}

// ── Touch ─────────────────────────────────────────────────────────────────────

/// A single active touch point, in client pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub client_x: f64,
    pub client_y: f64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> BoundingRect {
        BoundingRect {
            left: 100.0,
            top: 50.0,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn test_parse_pointer_event_computes_relative_position() {
        // Arrange
        let raw = RawPointerEvent {
            client_x: 500.0,
            client_y: 200.0,
            target: surface(),
            ..Default::default()
        };

        // Act
        let event = parse_pointer_event(&raw);

        // Assert
        assert_eq!(event.relative_x, 0.5);
        assert_eq!(event.relative_y, 0.25);
    }

    #[test]
    fn test_parse_pointer_event_clamps_outside_target() {
        let raw = RawPointerEvent {
            client_x: 10.0,
            client_y: 5000.0,
            target: surface(),
            ..Default::default()
        };

        let event = parse_pointer_event(&raw);

        assert_eq!(event.relative_x, 0.0);
        assert_eq!(event.relative_y, 1.0);
    }

    #[test]
    fn test_parse_pointer_event_handles_zero_sized_target() {
        let raw = RawPointerEvent {
            client_x: 10.0,
            client_y: 10.0,
            ..Default::default()
        };

        let event = parse_pointer_event(&raw);

        assert_eq!((event.relative_x, event.relative_y), (0.0, 0.0));
    }

    #[test]
    fn test_parse_pointer_event_normalizes_wheel_deltas() {
        // Positive deltaY (content scrolls down) must come out negative.
        let raw = RawPointerEvent {
            target: surface(),
            delta_y: 120.0,
            delta_x: -3.5,
            ..Default::default()
        };

        let event = parse_pointer_event(&raw);

        assert_eq!(event.vertical_wheel_delta, -1);
        assert_eq!(event.horizontal_wheel_delta, -1);
    }

    #[test]
    fn test_parse_pointer_event_zero_delta_stays_zero() {
        let event = parse_pointer_event(&RawPointerEvent {
            target: surface(),
            ..Default::default()
        });
        assert_eq!(event.vertical_wheel_delta, 0);
        assert_eq!(event.horizontal_wheel_delta, 0);
    }

    #[test]
    fn test_keystroke_event_asserts_only_modifier_codes() {
        // Arrange
        let pressed = [
            CanonicalCode::CONTROL_LEFT,
            CanonicalCode::SHIFT_RIGHT,
            CanonicalCode::from_static("KeyA"),
        ];

        // Act
        let event = KeystrokeEvent::new("C", CanonicalCode::from_static("KeyC"), pressed.iter());

        // Assert
        assert!(event.ctrl_left);
        assert!(event.shift_right);
        assert!(!event.ctrl_right && !event.shift_left && !event.alt_left);
        assert_eq!(
            event.asserted_modifiers(),
            vec![CanonicalCode::SHIFT_RIGHT, CanonicalCode::CONTROL_LEFT]
        );
    }

    #[test]
    fn test_default_keystroke_event_is_blank() {
        let event = KeystrokeEvent::default();

        assert_eq!(event.code, "");
        assert!(event.key.is_empty());
        assert!(event.asserted_modifiers().is_empty());
    }

    #[test]
    fn test_keystroke_event_serializes_with_camel_case_fields() {
        let event = KeystrokeEvent::new("a", CanonicalCode::from_static("KeyA"), []);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["code"], "KeyA");
        assert_eq!(json["metaLeft"], false);
        assert_eq!(json["ctrlRight"], false);
    }

    #[test]
    fn test_ime_placeholder_detection() {
        let raw = RawKeyEvent {
            code: String::new(),
            key: "Process".to_string(),
            key_code: 229,
            modifiers: ModifierSnapshot::default(),
        };
        assert!(raw.is_ime_placeholder());
    }
}
