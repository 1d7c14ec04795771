//! Application layer for the forwarder.
//!
//! # What lives here (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (`relay-core`: pure values and functions) and the infrastructure
//! (sockets, files, stdin).  Everything in here:
//!
//! - **Owns session state**: which keys are held, the throttle's interval,
//!   the touch gesture in progress.
//! - **Depends on abstractions** ([`transport::Transport`] and the ports in
//!   [`forward_input`]) so tests can inject recording doubles.
//! - **Performs no I/O of its own**; the only side effects are timers and
//!   tokio tasks.
//!
//! # Sub-modules
//!
//! - **`modifier_tracker`** – Per-key pressed state, reconciled against the
//!   aggregate modifier flags of each event.
//! - **`keystroke_queue`** – FIFO of keystrokes, one dispatch per 50 ms tick,
//!   never blocking on acknowledgements.
//! - **`pointer_throttle`** – Coalesces pointer moves; the interval adapts to
//!   the measured round-trip time.
//! - **`touch`** – Taps, long presses and two-finger scrolls become pointer
//!   events.
//! - **`forward_input`** – The per-session use case wiring all of the above.
//! - **`transport`** – The port through which events leave the process.

pub mod forward_input;
pub mod keystroke_queue;
pub mod modifier_tracker;
pub mod pointer_throttle;
pub mod touch;
pub mod transport;
