//! The transport port: how normalized events reach the remote peer.
//!
//! The application layer only knows this trait.  The WebSocket adapter lives
//! in `infrastructure::network`; tests use
//! `infrastructure::network::mock::RecordingTransport`.
//!
//! # Acknowledgements
//!
//! Keystrokes and pointer events are acknowledged by the peer with a boolean
//! success flag.  A `success: false` acknowledgement and a failed transport
//! call are both *forwarding failures*; neither is retried here.  Retries, if
//! any, are the transport's business.

use std::time::Duration;

use async_trait::async_trait;
use relay_core::{KeystrokeEvent, PointerEvent};
use thiserror::Error;

/// The peer's answer to an acknowledged request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const SUCCESS: Ack = Ack { success: true };
    pub const FAILURE: Ack = Ack { success: false };

    /// Converts the acknowledgement into the caller-facing outcome.
    pub fn into_result(self) -> Result<(), ForwardError> {
        if self.success {
            Ok(())
        } else {
            Err(ForwardError::Rejected)
        }
    }
}

/// Failures of the transport call itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("connection closed by peer")]
    Closed,
    #[error("no acknowledgement within {0:?}")]
    AckTimeout(Duration),
    #[error("failed to send frame: {0}")]
    Send(String),
}

/// Outcome of forwarding a single event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    /// The peer acknowledged the event with `success: false`.
    #[error("peer rejected the event")]
    Rejected,
    /// The transport failed before an acknowledgement arrived.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The session shut down before the event was dispatched.
    #[error("forwarding queue has shut down")]
    QueueClosed,
}

/// Channel delivering normalized events to the remote peer.
///
/// Shared by the keystroke queue and the pointer throttle; never mutated by
/// the pipeline, hence `&self` everywhere.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a keystroke and waits for its acknowledgement.
    async fn send_keystroke(&self, event: KeystrokeEvent) -> Result<Ack, TransportError>;

    /// Signals that all keys should be considered released.  Not acknowledged.
    async fn send_key_release(&self) -> Result<(), TransportError>;

    /// Sends a pointer event and waits for its acknowledgement.
    async fn send_pointer_event(&self, event: PointerEvent) -> Result<Ack, TransportError>;
}
