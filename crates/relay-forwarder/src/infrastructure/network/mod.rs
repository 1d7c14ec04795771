//! WebSocket transport to the remote peer.
//!
//! Implements [`Transport`] over a single WebSocket connection carrying the
//! JSON frames defined in [`relay_core::protocol::messages`].
//!
//! # Request/acknowledgement matching
//!
//! Keystroke and pointer frames carry a `request_id` from a
//! [`RequestIdCounter`].  The caller parks a oneshot sender in the `pending`
//! table under that id and waits; a reader task resolves it when the peer's
//! `Ack` with the same id arrives.  Requests can overlap freely: the keystroke
//! queue and the pointer throttle never wait for each other.
//!
//! ```text
//!   send_keystroke ──▶ pending[id] = tx ──▶ writer task ──▶ socket
//!         ▲                                                  │
//!         └──── rx ◀── reader task ◀── {"type":"Ack","request_id":id} ◀┘
//! ```
//!
//! A request with no acknowledgement after `ack_timeout` fails with
//! [`TransportError::AckTimeout`].  When the socket closes, every pending
//! request fails with [`TransportError::Closed`].

pub mod mock;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use relay_core::{InboundMessage, KeystrokeEvent, OutboundMessage, PointerEvent, RequestIdCounter};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::application::transport::{Ack, Transport, TransportError};

type PendingTable = Arc<Mutex<HashMap<u64, oneshot::Sender<bool>>>>;

fn lock(pending: &PendingTable) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<bool>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`Transport`] speaking JSON over one WebSocket connection.
pub struct WebSocketTransport {
    outbound: mpsc::UnboundedSender<WsMessage>,
    pending: PendingTable,
    request_ids: RequestIdCounter,
    ack_timeout: Duration,
    open: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Connects to the peer at `url` (`ws://` or `wss://`).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the TCP connection or the
    /// WebSocket handshake fails.
    pub async fn connect(url: &str, ack_timeout: Duration) -> Result<Self, TransportError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|err| TransportError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        info!("connected to peer at {url}");
        Ok(Self::from_stream(stream, ack_timeout))
    }

    /// Wraps an already-established WebSocket.  Must be called from within a
    /// tokio runtime.
    pub fn from_stream<S>(stream: WebSocketStream<S>, ack_timeout: Duration) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sink, mut source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<WsMessage>();
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let open = Arc::new(AtomicBool::new(true));

        // Writer: ends when every sender is gone or the socket rejects a frame.
        let writer_open = Arc::clone(&open);
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(err) = sink.send(frame).await {
                    warn!("failed to write to peer: {err}");
                    writer_open.store(false, Ordering::SeqCst);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader: resolves acknowledgements until the socket closes.
        let reader_pending = Arc::clone(&pending);
        let reader_open = Arc::clone(&open);
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match InboundMessage::from_json(&text) {
                        Ok(InboundMessage::Ack {
                            request_id,
                            success,
                        }) => {
                            trace!(request_id, success, "ack received");
                            match lock(&reader_pending).remove(&request_id) {
                                Some(waiter) => {
                                    let _ = waiter.send(success);
                                }
                                None => debug!(request_id, "ack for unknown or expired request"),
                            }
                        }
                        Err(err) => warn!("ignoring malformed frame from peer: {err}"),
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!("peer connection failed: {err}");
                        break;
                    }
                }
            }
            info!("peer connection closed");
            reader_open.store(false, Ordering::SeqCst);
            // Dropping the senders fails every waiter with `Closed`.
            lock(&reader_pending).clear();
        });

        Self {
            outbound,
            pending,
            request_ids: RequestIdCounter::new(),
            ack_timeout,
            open,
            reader,
        }
    }

    /// Whether the connection is still usable.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Asks the peer to close the connection.
    pub fn close(&self) {
        let _ = self.outbound.send(WsMessage::Close(None));
    }

    fn write(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        let text = message
            .to_json()
            .map_err(|err| TransportError::Send(err.to_string()))?;
        self.outbound
            .send(WsMessage::Text(text.into()))
            .map_err(|_| TransportError::Closed)
    }

    async fn request(
        &self,
        build: impl FnOnce(u64) -> OutboundMessage,
    ) -> Result<Ack, TransportError> {
        let request_id = self.request_ids.next();
        let (waiter, acked) = oneshot::channel();
        lock(&self.pending).insert(request_id, waiter);

        if let Err(err) = self.write(&build(request_id)) {
            lock(&self.pending).remove(&request_id);
            return Err(err);
        }

        match timeout(self.ack_timeout, acked).await {
            Ok(Ok(success)) => Ok(Ack { success }),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                lock(&self.pending).remove(&request_id);
                Err(TransportError::AckTimeout(self.ack_timeout))
            }
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send_keystroke(&self, event: KeystrokeEvent) -> Result<Ack, TransportError> {
        self.request(|request_id| OutboundMessage::Keystroke { request_id, event })
            .await
    }

    async fn send_key_release(&self) -> Result<(), TransportError> {
        self.write(&OutboundMessage::KeyRelease)
    }

    async fn send_pointer_event(&self, event: PointerEvent) -> Result<Ack, TransportError> {
        self.request(|request_id| OutboundMessage::Pointer { request_id, event })
            .await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::CanonicalCode;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    #[derive(Clone, Copy)]
    enum Peer {
        /// Acknowledges every request with the given flag.
        Ack(bool),
        /// Never answers.
        Silent,
        /// Closes right after the first frame.
        Hangup,
    }

    /// Starts a one-connection peer; returns its URL and the frames it saw.
    async fn spawn_peer(behaviour: Peer) -> (String, JoinHandle<Vec<OutboundMessage>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            let mut seen = Vec::new();
            while let Some(Ok(frame)) = ws.next().await {
                let WsMessage::Text(text) = frame else { continue };
                let message: OutboundMessage = serde_json::from_str(&text).unwrap();
                let request_id = message.request_id();
                seen.push(message);
                match (behaviour, request_id) {
                    (Peer::Ack(success), Some(request_id)) => {
                        let ack = serde_json::to_string(&InboundMessage::Ack {
                            request_id,
                            success,
                        })
                        .unwrap();
                        ws.send(WsMessage::Text(ack.into())).await.unwrap();
                    }
                    (Peer::Hangup, _) => {
                        let _ = ws.close(None).await;
                        break;
                    }
                    _ => {}
                }
            }
            seen
        });
        (url, task)
    }

    fn keystroke() -> KeystrokeEvent {
        KeystrokeEvent::new("a", CanonicalCode::from_static("KeyA"), [])
    }

    #[tokio::test]
    async fn test_keystroke_is_acknowledged() {
        // Arrange
        let (url, peer) = spawn_peer(Peer::Ack(true)).await;
        let transport = WebSocketTransport::connect(&url, Duration::from_secs(2))
            .await
            .unwrap();

        // Act
        let ack = transport.send_keystroke(keystroke()).await;
        transport.close();

        // Assert
        assert_eq!(ack, Ok(Ack::SUCCESS));
        let seen = peer.await.unwrap();
        assert!(matches!(seen[0], OutboundMessage::Keystroke { request_id: 0, .. }));
    }

    #[tokio::test]
    async fn test_negative_ack_is_passed_through() {
        let (url, _peer) = spawn_peer(Peer::Ack(false)).await;
        let transport = WebSocketTransport::connect(&url, Duration::from_secs(2))
            .await
            .unwrap();

        let ack = transport.send_pointer_event(PointerEvent::default()).await;

        assert_eq!(ack, Ok(Ack::FAILURE));
    }

    #[tokio::test]
    async fn test_overlapping_requests_are_matched_by_id() {
        let (url, _peer) = spawn_peer(Peer::Ack(true)).await;
        let transport = WebSocketTransport::connect(&url, Duration::from_secs(2))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            transport.send_keystroke(keystroke()),
            transport.send_pointer_event(PointerEvent::default()),
        );

        assert_eq!(a, Ok(Ack::SUCCESS));
        assert_eq!(b, Ok(Ack::SUCCESS));
    }

    #[tokio::test]
    async fn test_key_release_is_not_acknowledged() {
        let (url, peer) = spawn_peer(Peer::Silent).await;
        let transport = WebSocketTransport::connect(&url, Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(transport.send_key_release().await, Ok(()));
        transport.close();

        let seen = peer.await.unwrap();
        assert_eq!(seen, vec![OutboundMessage::KeyRelease]);
    }

    #[tokio::test]
    async fn test_missing_ack_times_out() {
        let (url, _peer) = spawn_peer(Peer::Silent).await;
        let transport = WebSocketTransport::connect(&url, Duration::from_millis(50))
            .await
            .unwrap();

        let result = transport.send_keystroke(keystroke()).await;

        assert_eq!(
            result,
            Err(TransportError::AckTimeout(Duration::from_millis(50)))
        );
    }

    #[tokio::test]
    async fn test_peer_hangup_fails_pending_request() {
        let (url, _peer) = spawn_peer(Peer::Hangup).await;
        let transport = WebSocketTransport::connect(&url, Duration::from_secs(5))
            .await
            .unwrap();

        let result = transport.send_keystroke(keystroke()).await;

        assert_eq!(result, Err(TransportError::Closed));
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_connect_to_nothing_fails() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = WebSocketTransport::connect(&url, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
