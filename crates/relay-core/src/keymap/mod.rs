//! Key code canonicalization.
//!
//! Raw keyboard events carry a `code` (physical key) and a `key` (display
//! label).  Different platforms disagree about a handful of code names; this
//! module irons those differences out so that everything downstream sees one
//! vocabulary: [`CanonicalCode`].
//!
//! Rules, in priority order:
//!
//! 1. A blank code with the generic `"Alt"` label is right-Alt.  Some layouts
//!    report AltGr as left-Control followed by an Alt event with no code.
//! 2. Legacy `OSLeft` / `OSRight` become `MetaLeft` / `MetaRight`.
//! 3. Anything else passes through unchanged.

pub mod codes;
pub mod layouts;

use tracing::debug;

pub use codes::{is_known_code, CanonicalCode};

/// One of the four modifier families, each with a left and right key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierFamily {
    Alt,
    Meta,
    Control,
    Shift,
}

impl ModifierFamily {
    /// All families, in the order they are reconciled.
    pub const ALL: [ModifierFamily; 4] = [
        ModifierFamily::Alt,
        ModifierFamily::Meta,
        ModifierFamily::Control,
        ModifierFamily::Shift,
    ];

    /// The canonical code of the family's left-hand key.
    pub fn left(self) -> CanonicalCode {
        match self {
            ModifierFamily::Alt => CanonicalCode::ALT_LEFT,
            ModifierFamily::Meta => CanonicalCode::META_LEFT,
            ModifierFamily::Control => CanonicalCode::CONTROL_LEFT,
            ModifierFamily::Shift => CanonicalCode::SHIFT_LEFT,
        }
    }

    /// The canonical code of the family's right-hand key.
    pub fn right(self) -> CanonicalCode {
        match self {
            ModifierFamily::Alt => CanonicalCode::ALT_RIGHT,
            ModifierFamily::Meta => CanonicalCode::META_RIGHT,
            ModifierFamily::Control => CanonicalCode::CONTROL_RIGHT,
            ModifierFamily::Shift => CanonicalCode::SHIFT_RIGHT,
        }
    }
}

/// Maps a raw `(code, key)` pair to its canonical code.
///
/// Never fails: codes the relay does not recognise are returned unchanged so
/// the remote side can decide what to do with them.
///
/// # Example
///
/// ```rust
/// use relay_core::keymap::canonicalize;
///
/// assert_eq!(canonicalize("OSLeft", "Meta"), "MetaLeft");
/// assert_eq!(canonicalize("", "Alt"), "AltRight");
/// assert_eq!(canonicalize("KeyA", "a"), "KeyA");
/// ```
pub fn canonicalize(raw_code: &str, raw_key_label: &str) -> CanonicalCode {
    if raw_key_label == "Alt" && raw_code.is_empty() {
        return CanonicalCode::ALT_RIGHT;
    }

    match raw_code {
        "OSLeft" => return CanonicalCode::META_LEFT,
        "OSRight" => return CanonicalCode::META_RIGHT,
        _ => {}
    }

    if !is_known_code(raw_code) {
        debug!(code = raw_code, key = raw_key_label, "passing unrecognized key code through");
    }
    CanonicalCode::passthrough(raw_code)
}

/// Returns `true` for the eight left/right modifier codes.
pub fn is_modifier_code(code: &CanonicalCode) -> bool {
    ModifierFamily::ALL
        .iter()
        .any(|family| *code == family.left() || *code == family.right())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
