//! Touch-to-Pointer Adapter.
//!
//! Translates touch gestures into the pointer events a remote machine with a
//! mouse understands:
//!
//! | gesture                                  | synthesized                        |
//! |------------------------------------------|------------------------------------|
//! | tap (released within 600 ms)             | primary down, then up              |
//! | long press (held 600 ms without moving)  | secondary down; up on release      |
//! | two-finger vertical drag                 | wheel steps, direction = drag      |
//!
//! Any movement cancels a pending long press.  Single-finger drags are not
//! translated.
//!
//! Synthesized events go to a [`PointerSink`], normally the pointer
//! throttle, so they are paced like real mouse input.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use relay_core::{buttons, BoundingRect, RawPointerEvent, TouchPoint};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant, Sleep};
use tracing::{debug, trace};

use super::pointer_throttle::PointerSink;

/// How long a touch must be held, without moving, to count as a long press.
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(600);

/// A pointer action synthesized from touch input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Synthesized {
    ButtonDown(RawPointerEvent),
    ButtonUp(RawPointerEvent),
    Wheel(RawPointerEvent),
}

/// What the driver must do with the long-press timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Arm,
    Cancel,
    Keep,
}

/// Gesture state for one touch sequence.
#[derive(Debug, Clone, Default)]
pub struct TouchGestureState {
    started_at: Option<Instant>,
    last_point: TouchPoint,
    target: BoundingRect,
    long_press_armed: bool,
    long_press_fired: bool,
    moving: bool,
    last_scroll_y: f64,
}

impl TouchGestureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// A finger touched down; starts a new sequence.
    pub fn touch_start(
        &mut self,
        now: Instant,
        touches: &[TouchPoint],
        target: BoundingRect,
    ) -> TimerCommand {
        let Some(&primary) = touches.first() else {
            return TimerCommand::Keep;
        };
        *self = TouchGestureState {
            started_at: Some(now),
            last_point: primary,
            target,
            long_press_armed: true,
            long_press_fired: false,
            moving: false,
            last_scroll_y: primary.client_y,
        };
        TimerCommand::Arm
    }

    /// Fingers moved.  Two-finger moves become wheel steps.
    pub fn touch_move(&mut self, touches: &[TouchPoint]) -> (TimerCommand, Option<Synthesized>) {
        self.moving = true;
        let command = if self.long_press_armed {
            self.long_press_armed = false;
            TimerCommand::Cancel
        } else {
            TimerCommand::Keep
        };

        let Some(&primary) = touches.first() else {
            return (command, None);
        };
        self.last_point = primary;

        if touches.len() != 2 {
            return (command, None);
        }
        let delta = primary.client_y - self.last_scroll_y;
        self.last_scroll_y = primary.client_y;
        if delta == 0.0 {
            return (command, None);
        }
        // Fingers moving down pull the content down, i.e. scroll up.
        let wheel = RawPointerEvent {
            delta_y: -delta,
            ..self.pointer_at(buttons::NONE)
        };
        (command, Some(Synthesized::Wheel(wheel)))
    }

    /// The long-press timer fired.
    pub fn long_press_elapsed(&mut self) -> Option<Synthesized> {
        let armed = std::mem::replace(&mut self.long_press_armed, false);
        if !armed || self.moving {
            return None;
        }
        self.long_press_fired = true;
        Some(Synthesized::ButtonDown(self.pointer_at(buttons::SECONDARY)))
    }

    /// The sequence ended (lift or cancel).
    ///
    /// Without an active sequence, e.g. the second finger of a scroll
    /// lifting, nothing is emitted.
    pub fn touch_end(&mut self, now: Instant) -> (TimerCommand, Vec<Synthesized>) {
        let Some(started) = self.started_at.take() else {
            return (TimerCommand::Keep, Vec::new());
        };
        let quick = now.saturating_duration_since(started) < LONG_PRESS_THRESHOLD;

        let up = Synthesized::ButtonUp(self.pointer_at(buttons::NONE));
        let command = if self.long_press_armed {
            TimerCommand::Cancel
        } else {
            TimerCommand::Keep
        };
        self.long_press_armed = false;

        if quick && !self.long_press_fired {
            let down = Synthesized::ButtonDown(self.pointer_at(buttons::PRIMARY));
            (command, vec![down, up])
        } else {
            (command, vec![up])
        }
    }

    fn pointer_at(&self, held: u8) -> RawPointerEvent {
        RawPointerEvent {
            client_x: self.last_point.client_x,
            client_y: self.last_point.client_y,
            target: self.target,
            buttons: held,
            ..Default::default()
        }
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum TouchCommand {
    Start {
        touches: Vec<TouchPoint>,
        target: BoundingRect,
    },
    Move {
        touches: Vec<TouchPoint>,
    },
    End,
}

/// A running touch adapter.
pub struct TouchAdapter {
    commands: mpsc::UnboundedSender<TouchCommand>,
    driver: JoinHandle<()>,
}

impl TouchAdapter {
    pub fn start(sink: Arc<dyn PointerSink>) -> Self {
        Self::with_threshold(sink, LONG_PRESS_THRESHOLD)
    }

    pub fn with_threshold(sink: Arc<dyn PointerSink>, long_press: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive(receiver, sink, long_press));
        Self { commands, driver }
    }

    pub fn touch_start(&self, touches: Vec<TouchPoint>, target: BoundingRect) {
        self.send(TouchCommand::Start { touches, target });
    }

    pub fn touch_move(&self, touches: Vec<TouchPoint>) {
        self.send(TouchCommand::Move { touches });
    }

    pub fn touch_end(&self) {
        self.send(TouchCommand::End);
    }

    /// Cancellation behaves exactly like a lift.
    pub fn touch_cancel(&self) {
        self.send(TouchCommand::End);
    }

    pub async fn shutdown(self) {
        let TouchAdapter { commands, driver } = self;
        drop(commands);
        if let Err(err) = driver.await {
            debug!("touch adapter driver ended abnormally: {err}");
        }
    }

    fn send(&self, command: TouchCommand) {
        if self.commands.send(command).is_err() {
            debug!("touch adapter stopped; dropping touch event");
        }
    }
}

fn emit(sink: &dyn PointerSink, action: Synthesized) {
    match action {
        Synthesized::ButtonDown(raw) => sink.button_down(&raw),
        Synthesized::ButtonUp(raw) => sink.button_up(&raw),
        Synthesized::Wheel(raw) => sink.wheel(&raw),
    }
}

async fn expiry(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(sleep) => sleep.await,
        None => pending().await,
    }
}

async fn drive(
    mut commands: mpsc::UnboundedReceiver<TouchCommand>,
    sink: Arc<dyn PointerSink>,
    long_press: Duration,
) {
    let mut state = TouchGestureState::new();
    let mut timer: Option<Pin<Box<Sleep>>> = None;

    let apply = |timer: &mut Option<Pin<Box<Sleep>>>, command: TimerCommand| match command {
        TimerCommand::Arm => *timer = Some(Box::pin(sleep(long_press))),
        TimerCommand::Cancel => *timer = None,
        TimerCommand::Keep => {}
    };

    loop {
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(TouchCommand::Start { touches, target }) => {
                    let timer_command = state.touch_start(Instant::now(), &touches, target);
                    apply(&mut timer, timer_command);
                }
                Some(TouchCommand::Move { touches }) => {
                    let (timer_command, action) = state.touch_move(&touches);
                    apply(&mut timer, timer_command);
                    if let Some(action) = action {
                        trace!("two-finger scroll");
                        emit(sink.as_ref(), action);
                    }
                }
                Some(TouchCommand::End) => {
                    let (timer_command, actions) = state.touch_end(Instant::now());
                    apply(&mut timer, timer_command);
                    for action in actions {
                        emit(sink.as_ref(), action);
                    }
                }
                None => break,
            },
            () = expiry(&mut timer), if timer.is_some() => {
                timer = None;
                if let Some(action) = state.long_press_elapsed() {
                    debug!("long press; synthesizing secondary button");
                    emit(sink.as_ref(), action);
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
