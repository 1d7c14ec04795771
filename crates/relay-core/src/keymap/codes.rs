//! The canonical key-code vocabulary.
//!
//! Canonical codes are the DOM `KeyboardEvent.code` names: they identify a
//! *physical key position* (e.g. `KeyA`, `ShiftRight`, `Digit2`) rather than
//! the character the key produces.  The character depends on the keyboard
//! layout and the modifiers held down; the position does not.
//!
//! # Why a string newtype?
//!
//! The remote peer consumes code names as strings, and the canonicalizer must
//! pass unknown codes through unchanged rather than failing.  A closed enum
//! could not represent "a code we have never heard of", so [`CanonicalCode`]
//! wraps a `Cow<'static, str>`: well-known codes are borrowed from static
//! storage at zero cost, unknown ones are owned.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform-independent identifier for a physical key.
///
/// Produced by [`canonicalize`](crate::keymap::canonicalize) and
/// [`find_key_code`](crate::keymap::layouts::find_key_code).  Immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalCode(Cow<'static, str>);

impl CanonicalCode {
    pub const ALT_LEFT: Self = Self::from_static("AltLeft");
    pub const ALT_RIGHT: Self = Self::from_static("AltRight");
    pub const CONTROL_LEFT: Self = Self::from_static("ControlLeft");
    pub const CONTROL_RIGHT: Self = Self::from_static("ControlRight");
    pub const META_LEFT: Self = Self::from_static("MetaLeft");
    pub const META_RIGHT: Self = Self::from_static("MetaRight");
    pub const SHIFT_LEFT: Self = Self::from_static("ShiftLeft");
    pub const SHIFT_RIGHT: Self = Self::from_static("ShiftRight");
    pub const ENTER: Self = Self::from_static("Enter");
    pub const TAB: Self = Self::from_static("Tab");
    pub const SPACE: Self = Self::from_static("Space");

    /// Wraps a code name that lives in static storage.
    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    /// Wraps a raw code name exactly as reported by the environment.
    ///
    /// Used when no better mapping exists: canonicalization is best-effort and
    /// unknown codes travel to the remote side unchanged.
    pub fn passthrough(raw: impl Into<String>) -> Self {
        Self(Cow::Owned(raw.into()))
    }

    /// Returns the code name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this code belongs to the known vocabulary.
    pub fn is_known(&self) -> bool {
        is_known_code(self.as_str())
    }
}

impl fmt::Display for CanonicalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for CanonicalCode {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for CanonicalCode {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Every `KeyboardEvent.code` name the relay knows about.
///
/// Codes outside this list are still forwarded; membership only decides
/// whether the canonicalizer logs the code as unrecognized.
const KNOWN_CODES: &[&str] = &[
    // Letters
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK",
    "KeyL", "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ", "KeyR", "KeyS", "KeyT", "KeyU", "KeyV",
    "KeyW", "KeyX", "KeyY", "KeyZ",
    // Digits
    "Digit1", "Digit2", "Digit3", "Digit4", "Digit5", "Digit6", "Digit7", "Digit8", "Digit9",
    "Digit0",
    // Control and punctuation
    "Enter", "Escape", "Backspace", "Tab", "Space", "Minus", "Equal", "BracketLeft",
    "BracketRight", "Backslash", "IntlBackslash", "Semicolon", "Quote", "Backquote", "Comma",
    "Period", "Slash", "CapsLock",
    // Function keys
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
    // Navigation cluster
    "PrintScreen", "ScrollLock", "Pause", "Insert", "Home", "PageUp", "Delete", "End",
    "PageDown", "ArrowRight", "ArrowLeft", "ArrowDown", "ArrowUp",
    // Numpad
    "NumLock", "NumpadDivide", "NumpadMultiply", "NumpadSubtract", "NumpadAdd",
    "NumpadEnter", "Numpad1", "Numpad2", "Numpad3", "Numpad4", "Numpad5", "Numpad6",
    "Numpad7", "Numpad8", "Numpad9", "Numpad0", "NumpadDecimal",
    // Modifiers and menu
    "ContextMenu", "ControlLeft", "ShiftLeft", "AltLeft", "MetaLeft", "ControlRight",
    "ShiftRight", "AltRight", "MetaRight",
];

/// Returns `true` if `code` is part of the known code vocabulary.
pub fn is_known_code(code: &str) -> bool {
    KNOWN_CODES.contains(&code)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_passthrough_codes_compare_by_content() {
        assert_eq!(CanonicalCode::passthrough("KeyA"), CanonicalCode::from_static("KeyA"));
    }

    #[test]
    fn test_known_vocabulary_includes_all_modifier_sides() {
        for code in [
            CanonicalCode::ALT_LEFT,
            CanonicalCode::ALT_RIGHT,
            CanonicalCode::CONTROL_LEFT,
            CanonicalCode::CONTROL_RIGHT,
            CanonicalCode::META_LEFT,
            CanonicalCode::META_RIGHT,
            CanonicalCode::SHIFT_LEFT,
            CanonicalCode::SHIFT_RIGHT,
        ] {
            assert!(code.is_known(), "{code} must be in the vocabulary");
        }
    }

    #[test]
    fn test_vendor_code_is_not_known() {
        assert!(!is_known_code("Lang1"));
        assert!(!is_known_code("OSLeft"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        // Arrange
        let code = CanonicalCode::SHIFT_RIGHT;

        // Act
        let json = serde_json::to_string(&code).unwrap();
        let restored: CanonicalCode = serde_json::from_str(&json).unwrap();

        // Assert
        assert_eq!(json, "\"ShiftRight\"");
        assert_eq!(restored, code);
    }
}
