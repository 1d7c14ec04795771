//! Recording transport for tests.
//!
//! Records every frame it is asked to send together with the (tokio) instant
//! of the call, so tests can check both ordering and cadence.  Latency and
//! acknowledgement outcomes are configurable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use relay_core::{KeystrokeEvent, PointerEvent};
use tokio::time::Instant;

use crate::application::transport::{Ack, Transport, TransportError};

/// One frame handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum SentFrame {
    Keystroke(KeystrokeEvent),
    KeyRelease,
    Pointer(PointerEvent),
}

/// A [`Transport`] that records calls instead of sending them.
pub struct RecordingTransport {
    frames: Mutex<Vec<(Instant, SentFrame)>>,
    latency: Duration,
    ack_success: AtomicBool,
    failure: Mutex<Option<TransportError>>,
}

impl RecordingTransport {
    /// Acknowledges everything immediately and successfully.
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Waits `latency` before acknowledging each request.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            latency,
            ack_success: AtomicBool::new(true),
            failure: Mutex::new(None),
        }
    }

    /// Sets the `success` flag of subsequent acknowledgements.
    pub fn set_ack_success(&self, success: bool) {
        self.ack_success.store(success, Ordering::SeqCst);
    }

    /// Makes subsequent calls fail with `error` (or succeed again with `None`).
    pub fn fail_with(&self, error: Option<TransportError>) {
        *self.failure.lock().expect("lock poisoned") = error;
    }

    /// All recorded frames, in call order.
    pub fn frames(&self) -> Vec<SentFrame> {
        self.timed_frames().into_iter().map(|(_, frame)| frame).collect()
    }

    /// All recorded frames with the instant each call started.
    pub fn timed_frames(&self) -> Vec<(Instant, SentFrame)> {
        self.frames.lock().expect("lock poisoned").clone()
    }

    /// Recorded keystrokes only.
    pub fn keystrokes(&self) -> Vec<KeystrokeEvent> {
        self.frames()
            .into_iter()
            .filter_map(|frame| match frame {
                SentFrame::Keystroke(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Recorded pointer events only.
    pub fn pointer_events(&self) -> Vec<PointerEvent> {
        self.frames()
            .into_iter()
            .filter_map(|frame| match frame {
                SentFrame::Pointer(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Number of key-release signals recorded.
    pub fn release_count(&self) -> usize {
        self.frames()
            .iter()
            .filter(|frame| matches!(frame, SentFrame::KeyRelease))
            .count()
    }

    async fn complete(&self, frame: SentFrame) -> Result<Ack, TransportError> {
        self.frames
            .lock()
            .expect("lock poisoned")
            .push((Instant::now(), frame));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(err) = self.failure.lock().expect("lock poisoned").clone() {
            return Err(err);
        }
        Ok(Ack {
            success: self.ack_success.load(Ordering::SeqCst),
        })
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_keystroke(&self, event: KeystrokeEvent) -> Result<Ack, TransportError> {
        self.complete(SentFrame::Keystroke(event)).await
    }

    async fn send_key_release(&self) -> Result<(), TransportError> {
        self.complete(SentFrame::KeyRelease).await.map(|_| ())
    }

    async fn send_pointer_event(&self, event: PointerEvent) -> Result<Ack, TransportError> {
        self.complete(SentFrame::Pointer(event)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::CanonicalCode;

    #[tokio::test]
    async fn test_default_transport_acks_successfully() {
        let transport = RecordingTransport::default();

        let ack = transport
            .send_pointer_event(PointerEvent::default())
            .await
            .unwrap();

        assert!(ack.success);
        assert_eq!(transport.pointer_events().len(), 1);
    }

    #[tokio::test]
    async fn test_recording_transport_records_in_order() {
        // Arrange
        let transport = RecordingTransport::new();
        let key = KeystrokeEvent::new("a", CanonicalCode::from_static("KeyA"), []);

        // Act
        transport.send_keystroke(key.clone()).await.unwrap();
        transport.send_key_release().await.unwrap();
        transport
            .send_pointer_event(PointerEvent::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(
            transport.frames(),
            vec![
                SentFrame::Keystroke(key),
                SentFrame::KeyRelease,
                SentFrame::Pointer(PointerEvent::default()),
            ]
        );
        assert_eq!(transport.release_count(), 1);
    }

    #[tokio::test]
    async fn test_recording_transport_reports_configured_outcome() {
        let transport = RecordingTransport::new();

        transport.set_ack_success(false);
        let ack = transport.send_pointer_event(PointerEvent::default()).await;
        assert_eq!(ack, Ok(Ack::FAILURE));

        transport.fail_with(Some(TransportError::Closed));
        let err = transport.send_key_release().await;
        assert_eq!(err, Err(TransportError::Closed));
    }
}
