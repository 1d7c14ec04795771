//! Modifier State Tracker: which keys the operator is holding right now.
//!
//! # Why reconciliation is needed
//!
//! Two sources of truth disagree in complementary ways:
//!
//! - **Per-key codes** (`ShiftRight`, `ControlLeft`, …) say exactly which side
//!   was pressed or released, but only at the moment of the transition.  If a
//!   release is lost (the window lost focus while the key was held, say), the
//!   cached state stays wrong indefinitely.
//! - **Aggregate flags** on every event (`shift: true`) are always current,
//!   but do not say which side is held.
//!
//! The tracker caches per-key state and, on every press of a *non-modifier*
//! key, reconciles the cache against that event's aggregate flags.  Drift is
//! therefore bounded to at most one event.  When the flags say a family is
//! held but the cache has neither side, the left side is assumed: the real
//! side cannot be recovered from the flags alone.

use std::collections::{HashMap, HashSet};

use relay_core::{
    canonicalize, is_modifier_code, CanonicalCode, KeystrokeEvent, ModifierFamily,
    ModifierSnapshot, RawKeyEvent,
};
use tracing::trace;

/// Owns the session's pressed-key set.
///
/// Nothing else mutates the set; other components read it through the query
/// methods.
#[derive(Debug, Default)]
pub struct ModifierStateTracker {
    pressed: HashMap<CanonicalCode, bool>,
}

impl ModifierStateTracker {
    /// Creates a tracker with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key press and returns its canonical code.
    ///
    /// Presses of non-modifier keys also reconcile all four modifier families
    /// against the flags carried on `raw`.
    pub fn on_press(&mut self, raw: &RawKeyEvent) -> CanonicalCode {
        let code = canonicalize(&raw.code, &raw.key);
        self.pressed.insert(code.clone(), true);
        if !is_modifier_code(&code) {
            self.reconcile(&raw.modifiers);
        }
        code
    }

    /// Records a key release and returns its canonical code.
    ///
    /// No reconciliation: the released code is authoritative for its side.
    pub fn on_release(&mut self, raw: &RawKeyEvent) -> CanonicalCode {
        let code = canonicalize(&raw.code, &raw.key);
        self.pressed.insert(code.clone(), false);
        code
    }

    /// Aligns cached modifier state with the aggregate flags in `snapshot`.
    pub fn reconcile(&mut self, snapshot: &ModifierSnapshot) {
        for family in ModifierFamily::ALL {
            let (left, right) = (family.left(), family.right());
            if !snapshot.is_asserted(family) {
                self.pressed.insert(left, false);
                self.pressed.insert(right, false);
            } else if !self.is_pressed(&left) && !self.is_pressed(&right) {
                trace!(?family, "modifier held but untracked; assuming left side");
                self.pressed.insert(left, true);
            }
        }
    }

    /// Returns whether `code` is currently tracked as pressed.
    pub fn is_pressed(&self, code: &CanonicalCode) -> bool {
        self.pressed.get(code).copied().unwrap_or(false)
    }

    /// Returns every modifier code currently tracked as pressed.
    pub fn all_pressed_modifiers(&self) -> HashSet<CanonicalCode> {
        self.pressed
            .iter()
            .filter(|&(code, &pressed)| pressed && is_modifier_code(code))
            .map(|(code, _)| code.clone())
            .collect()
    }

    /// Builds the keystroke for `code` with the currently held modifiers.
    pub fn keystroke_for(&self, key: &str, code: CanonicalCode) -> KeystrokeEvent {
        let modifiers = self.all_pressed_modifiers();
        KeystrokeEvent::new(key, code, modifiers.iter())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
