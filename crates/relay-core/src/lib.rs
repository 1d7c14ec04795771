//! # relay-core
//!
//! Shared library for the input relay containing the canonical key vocabulary,
//! the code canonicalizer, keyboard layouts for text playback, the input-event
//! value objects, and the JSON messages carried by the transport.
//!
//! This crate has zero dependencies on async runtimes, sockets, or the file
//! system.  Everything in it is a pure function or an immutable value.
//!
//! # Architecture overview (for beginners)
//!
//! The relay forwards an operator's keyboard and pointer actions to a remote
//! peer.  Raw events arriving from the local environment are inconsistent
//! across platforms: the same physical key can be reported under different
//! names, modifier keys are often reported without saying which side was
//! pressed, and input-method editors inject placeholder events.
//!
//! This crate (`relay-core`) is the shared foundation.  It defines:
//!
//! - **`keymap`** – The canonical key-code vocabulary (DOM `KeyboardEvent.code`
//!   names), the canonicalizer that irons out platform quirks, and the
//!   `en-US` / `en-GB` layouts used to turn pasted text into keystrokes.
//!
//! - **`domain`** – Value objects: modifier snapshots, keystroke and pointer
//!   events, and the raw descriptors they are derived from.
//!
//! - **`protocol`** – The JSON messages exchanged with the remote peer and the
//!   request-id counter used to match acknowledgements to requests.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::events::{
    buttons, parse_pointer_event, BoundingRect, KeystrokeEvent, ModifierSnapshot, PointerEvent,
    RawKeyEvent, RawPointerEvent, TouchPoint, IME_COMPOSITION_KEY_CODE,
};
pub use keymap::codes::CanonicalCode;
pub use keymap::layouts::{find_key_code, requires_shift_key, KeyboardLayout};
pub use keymap::{canonicalize, is_modifier_code, ModifierFamily};
pub use protocol::messages::{InboundMessage, OutboundMessage, ProtocolError};
pub use protocol::sequence::RequestIdCounter;
