//! Domain layer: value objects describing input events.
//!
//! Nothing in here performs I/O or holds mutable session state.  Session
//! state (which keys are pressed, throttle timing, touch gestures) belongs to
//! the forwarder's application layer, which owns it exclusively.

pub mod events;

pub use events::{
    buttons, parse_pointer_event, BoundingRect, KeystrokeEvent, ModifierSnapshot, PointerEvent,
    RawKeyEvent, RawPointerEvent, TouchPoint, IME_COMPOSITION_KEY_CODE,
};
