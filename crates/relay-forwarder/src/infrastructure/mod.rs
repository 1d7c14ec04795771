//! Infrastructure layer for the forwarder.
//!
//! Contains the adapters that touch the outside world: input sources, the
//! WebSocket transport, file-system storage, and the UI notifier.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `relay_core`.  The one exception flowing the other way is
//! [`input_source::RawInputEvent`], the vocabulary every input source
//! produces and the session consumes.

pub mod input_source;
pub mod network;
pub mod storage;
pub mod ui_bridge;
