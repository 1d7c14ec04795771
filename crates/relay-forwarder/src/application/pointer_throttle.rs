//! Adaptive Pointer Throttle.
//!
//! Pointer moves and wheel steps arrive far faster than a remote peer can
//! usefully apply them.  The throttle sends at most one *best-effort* event per
//! interval and coalesces the rest into a single pending slot: only the most
//! recent move survives.  Button transitions are *priority* events; they
//! discard any pending move, cancel the timer, and go out immediately.
//!
//! # Adaptation
//!
//! The interval follows the observed round-trip time of acknowledged events:
//!
//! | outcome   | next interval                              |
//! |-----------|--------------------------------------------|
//! | success   | `min((rtt/2 * 2 + current) / 3, ceiling)`  |
//! | failure   | `min(current + 500 ms, ceiling)`           |
//!
//! The ceiling is [`MAX_THROTTLE_INTERVAL`].  There is no floor: a fast link
//! drives the interval towards zero.
//!
//! The decision logic is [`ThrottleState`], a plain state machine with no
//! timers of its own.  [`PointerThrottle`] wraps it in a driver task that owns
//! the timer and the in-flight sends.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use relay_core::{parse_pointer_event, PointerEvent, RawPointerEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant, Sleep};
use tracing::{debug, trace, warn};

use super::transport::Transport;

/// Upper bound of the adaptive interval.
pub const MAX_THROTTLE_INTERVAL: Duration = Duration::from_millis(2000);

/// Interval used before any round trip has been measured.
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(100);

/// Penalty added to the interval for every failed send.
pub const FAILURE_BACKOFF: Duration = Duration::from_millis(500);

/// Computes the interval following a send that took `rtt`.
pub fn next_interval(current: Duration, rtt: Duration, success: bool) -> Duration {
    let next = if success {
        (rtt / 2 * 2 + current) / 3
    } else {
        current + FAILURE_BACKOFF
    };
    next.min(MAX_THROTTLE_INTERVAL)
}

// ── State machine ─────────────────────────────────────────────────────────────

/// Pure throttle state: the interval, one pending slot, the timer flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleState {
    interval: Duration,
    pending: Option<PointerEvent>,
    timer_active: bool,
}

impl ThrottleState {
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            interval: initial_interval.min(MAX_THROTTLE_INTERVAL),
            pending: None,
            timer_active: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pending(&self) -> Option<&PointerEvent> {
        self.pending.as_ref()
    }

    pub fn timer_active(&self) -> bool {
        self.timer_active
    }

    /// Offers an event.  Returns it back if it must be sent now, in which
    /// case the caller (re)starts the timer for [`interval`](Self::interval).
    ///
    /// Priority events first clear the pending slot and the timer.
    pub fn submit(&mut self, event: PointerEvent, priority: bool) -> Option<PointerEvent> {
        if priority {
            self.pending = None;
            self.timer_active = false;
        }
        if self.timer_active {
            self.pending = Some(event);
            None
        } else {
            self.timer_active = true;
            Some(event)
        }
    }

    /// Handles timer expiry.  Returns the pending event to send, if any; the
    /// timer then stays active and must be restarted by the caller.
    pub fn on_timer_expired(&mut self) -> Option<PointerEvent> {
        match self.pending.take() {
            Some(event) => Some(event),
            None => {
                self.timer_active = false;
                None
            }
        }
    }

    /// Feeds a measured round trip into the interval.  Returns the new value.
    pub fn record_round_trip(&mut self, rtt: Duration, success: bool) -> Duration {
        self.interval = next_interval(self.interval, rtt, success);
        self.interval
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Consumer of normalized pointer input.
///
/// Implemented by [`PointerHandle`]; the touch adapter writes into it.
pub trait PointerSink: Send + Sync {
    fn button_down(&self, raw: &RawPointerEvent);
    fn button_up(&self, raw: &RawPointerEvent);
    fn motion(&self, raw: &RawPointerEvent);
    fn wheel(&self, raw: &RawPointerEvent);
}

#[derive(Debug)]
struct Submission {
    event: PointerEvent,
    priority: bool,
}

/// Cloneable sender side of a running throttle.
#[derive(Clone)]
pub struct PointerHandle {
    commands: mpsc::UnboundedSender<Submission>,
    interval: watch::Receiver<Duration>,
}

impl PointerHandle {
    /// The current adaptive interval.
    pub fn current_interval(&self) -> Duration {
        *self.interval.borrow()
    }

    fn submit(&self, raw: &RawPointerEvent, priority: bool) {
        let event = parse_pointer_event(raw);
        if self.commands.send(Submission { event, priority }).is_err() {
            debug!("pointer throttle stopped; dropping event");
        }
    }
}

impl PointerSink for PointerHandle {
    fn button_down(&self, raw: &RawPointerEvent) {
        self.submit(raw, true);
    }

    fn button_up(&self, raw: &RawPointerEvent) {
        self.submit(raw, true);
    }

    fn motion(&self, raw: &RawPointerEvent) {
        self.submit(raw, false);
    }

    fn wheel(&self, raw: &RawPointerEvent) {
        self.submit(raw, false);
    }
}

/// A running throttle: its handle plus the driver task.
pub struct PointerThrottle {
    handle: PointerHandle,
    driver: JoinHandle<()>,
}

impl PointerThrottle {
    /// Starts a throttle with [`DEFAULT_THROTTLE_INTERVAL`].
    pub fn start(transport: Arc<dyn Transport>) -> Self {
        Self::with_interval(transport, DEFAULT_THROTTLE_INTERVAL)
    }

    pub fn with_interval(transport: Arc<dyn Transport>, initial: Duration) -> Self {
        let state = ThrottleState::new(initial);
        let (commands, receiver) = mpsc::unbounded_channel();
        let (interval_tx, interval) = watch::channel(state.interval());
        let driver = tokio::spawn(drive(state, receiver, transport, interval_tx));
        Self {
            handle: PointerHandle { commands, interval },
            driver,
        }
    }

    /// A new handle feeding this throttle.
    pub fn handle(&self) -> PointerHandle {
        self.handle.clone()
    }

    pub fn current_interval(&self) -> Duration {
        self.handle.current_interval()
    }

    /// Closes this handle and waits for the driver.
    ///
    /// The driver flushes a pending event and finishes in-flight sends once
    /// every other handle has been dropped too.
    pub async fn shutdown(self) {
        let PointerThrottle { handle, driver } = self;
        drop(handle);
        if let Err(err) = driver.await {
            debug!("pointer throttle driver ended abnormally: {err}");
        }
    }
}

impl PointerSink for PointerThrottle {
    fn button_down(&self, raw: &RawPointerEvent) {
        self.handle.button_down(raw);
    }

    fn button_up(&self, raw: &RawPointerEvent) {
        self.handle.button_up(raw);
    }

    fn motion(&self, raw: &RawPointerEvent) {
        self.handle.motion(raw);
    }

    fn wheel(&self, raw: &RawPointerEvent) {
        self.handle.wheel(raw);
    }
}

async fn expiry(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(sleep) => sleep.await,
        None => pending().await,
    }
}

async fn send_timed(transport: Arc<dyn Transport>, event: PointerEvent) -> (Duration, bool) {
    let started = Instant::now();
    let success = match transport.send_pointer_event(event).await {
        Ok(ack) => {
            if !ack.success {
                warn!("peer rejected pointer event");
            }
            ack.success
        }
        Err(err) => {
            warn!("failed to forward pointer event: {err}");
            false
        }
    };
    (started.elapsed(), success)
}

async fn drive(
    mut state: ThrottleState,
    mut commands: mpsc::UnboundedReceiver<Submission>,
    transport: Arc<dyn Transport>,
    interval_tx: watch::Sender<Duration>,
) {
    let mut timer: Option<Pin<Box<Sleep>>> = None;
    let mut in_flight = FuturesUnordered::new();
    let mut closed = false;

    loop {
        tokio::select! {
            biased;
            Some((rtt, success)) = in_flight.next(), if !in_flight.is_empty() => {
                let interval = state.record_round_trip(rtt, success);
                trace!(?rtt, success, ?interval, "pointer interval adapted");
                interval_tx.send_replace(interval);
            }
            command = commands.recv(), if !closed => match command {
                Some(Submission { event, priority }) => {
                    if priority {
                        timer = None;
                    }
                    if let Some(event) = state.submit(event, priority) {
                        in_flight.push(send_timed(Arc::clone(&transport), event));
                        timer = Some(Box::pin(sleep(state.interval())));
                    }
                }
                None => closed = true,
            },
            () = expiry(&mut timer), if timer.is_some() => {
                timer = None;
                if let Some(event) = state.on_timer_expired() {
                    in_flight.push(send_timed(Arc::clone(&transport), event));
                    timer = Some(Box::pin(sleep(state.interval())));
                }
            }
            else => break,
        }
    }
    trace!("pointer throttle stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
