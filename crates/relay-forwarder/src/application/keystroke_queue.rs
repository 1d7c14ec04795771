//! Keystroke Forwarding Queue: FIFO, paced, non-blocking.
//!
//! # Behaviour
//!
//! Jobs (keystrokes and key-release signals) are appended to an unbounded
//! FIFO.  A driver task wakes every [`KEYSTROKE_TICK`] and pops **at most one**
//! job per wake, handing it to the transport.  The driver does not wait for
//! the acknowledgement before the next tick: sends overlap, but they are
//! always *issued* in enqueue order.
//!
//! Each enqueue returns a [`KeystrokeAck`], a future resolving with the
//! transport's outcome for that job.  Nothing is dropped: when the queue
//! handle goes away the driver keeps draining at the same cadence, and only
//! exits once the backlog and every in-flight send are done.
//!
//! ```text
//!   enqueue ──▶ [ job | job | job ] ──tick──▶ transport.send_*  (in flight)
//!                                     50 ms        │
//!                                                  ▼
//!                                         KeystrokeAck resolves
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use relay_core::KeystrokeEvent;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

use super::transport::{ForwardError, Transport};

/// Interval between two dequeues.
pub const KEYSTROKE_TICK: Duration = Duration::from_millis(50);

type Reply = oneshot::Sender<Result<(), ForwardError>>;

enum Job {
    Keystroke { event: KeystrokeEvent, reply: Reply },
    Release { reply: Reply },
}

/// Resolves with the outcome of one queued job.
///
/// Dropping it does not cancel the job.
#[derive(Debug)]
#[must_use = "the acknowledgement reports whether the keystroke was delivered"]
pub struct KeystrokeAck {
    receiver: oneshot::Receiver<Result<(), ForwardError>>,
}

impl Future for KeystrokeAck {
    type Output = Result<(), ForwardError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(Err(ForwardError::QueueClosed)))
    }
}

/// Handle to a running keystroke queue.
pub struct KeystrokeQueue {
    jobs: mpsc::UnboundedSender<Job>,
    backlog: Arc<AtomicUsize>,
    driver: JoinHandle<()>,
}

impl KeystrokeQueue {
    /// Starts a queue draining into `transport` every [`KEYSTROKE_TICK`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(transport: Arc<dyn Transport>) -> Self {
        Self::with_tick(transport, KEYSTROKE_TICK)
    }

    /// Starts a queue with a custom dequeue interval.
    pub fn with_tick(transport: Arc<dyn Transport>, tick: Duration) -> Self {
        let (jobs, receiver) = mpsc::unbounded_channel();
        let backlog = Arc::new(AtomicUsize::new(0));
        let driver = tokio::spawn(drive(receiver, transport, tick, Arc::clone(&backlog)));
        Self {
            jobs,
            backlog,
            driver,
        }
    }

    /// Appends a keystroke.  Never blocks and never fails synchronously.
    pub fn enqueue(&self, event: KeystrokeEvent) -> KeystrokeAck {
        let (reply, receiver) = oneshot::channel();
        self.push(Job::Keystroke { event, reply });
        KeystrokeAck { receiver }
    }

    /// Appends a key-release signal, ordered with the keystrokes around it.
    pub fn enqueue_release(&self) -> KeystrokeAck {
        let (reply, receiver) = oneshot::channel();
        self.push(Job::Release { reply });
        KeystrokeAck { receiver }
    }

    /// Number of jobs waiting to be dispatched.
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::SeqCst)
    }

    /// Stops accepting jobs and waits until the backlog has been delivered.
    pub async fn shutdown(self) {
        let KeystrokeQueue { jobs, driver, .. } = self;
        drop(jobs);
        if let Err(err) = driver.await {
            debug!("keystroke queue driver ended abnormally: {err}");
        }
    }

    fn push(&self, job: Job) {
        self.backlog.fetch_add(1, Ordering::SeqCst);
        // The receiver lives as long as the driver, which outlives every sender.
        // If it is gone anyway, the dropped reply resolves the ack with QueueClosed.
        if self.jobs.send(job).is_err() {
            self.backlog.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

async fn drive(
    mut jobs: mpsc::UnboundedReceiver<Job>,
    transport: Arc<dyn Transport>,
    tick: Duration,
    backlog: Arc<AtomicUsize>,
) {
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = FuturesUnordered::new();
    let mut closed = false;

    loop {
        tokio::select! {
            biased;
            Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
            _ = ticker.tick(), if !closed => match jobs.try_recv() {
                Ok(job) => {
                    backlog.fetch_sub(1, Ordering::SeqCst);
                    in_flight.push(dispatch(Arc::clone(&transport), job));
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
                Err(mpsc::error::TryRecvError::Disconnected) => closed = true,
            },
            else => break,
        }
    }
    trace!("keystroke queue drained");
}

async fn dispatch(transport: Arc<dyn Transport>, job: Job) {
    let (outcome, reply) = match job {
        Job::Keystroke { event, reply } => {
            trace!(code = %event.code, "dispatching keystroke");
            let outcome = match transport.send_keystroke(event).await {
                Ok(ack) => ack.into_result(),
                Err(err) => Err(ForwardError::Transport(err)),
            };
            (outcome, reply)
        }
        Job::Release { reply } => {
            trace!("dispatching key release");
            let outcome = transport
                .send_key_release()
                .await
                .map_err(ForwardError::Transport);
            (outcome, reply)
        }
    };
    // A dropped KeystrokeAck means nobody is waiting for the outcome.
    let _ = reply.send(outcome);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
