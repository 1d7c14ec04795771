//! Wire protocol between the relay and the remote peer.
//!
//! Messages are JSON text frames tagged by a `"type"` field; see
//! [`messages`].  Requests that expect an acknowledgement carry a
//! `request_id` drawn from a [`RequestIdCounter`].

pub mod messages;
pub mod sequence;

pub use messages::{InboundMessage, OutboundMessage};
pub use sequence::RequestIdCounter;
