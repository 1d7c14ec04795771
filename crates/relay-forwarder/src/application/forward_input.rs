//! ForwardInputUseCase: one operator session's input pipeline.
//!
//! The session owns every piece of mutable pipeline state: the modifier
//! tracker, the keystroke queue, the pointer throttle and the touch adapter.
//! Nothing is process-global; two sessions never share state.
//!
//! ```text
//!   RawInputEvent
//!     ├─ KeyDown / KeyUp ──▶ ModifierStateTracker ──▶ KeystrokeQueue ──┐
//!     ├─ Paste ────────────▶ KeyboardLayout ─────────▶ KeystrokeQueue ──┤
//!     ├─ Pointer* / Wheel ─────────────────────────▶ PointerThrottle ──┼──▶ Transport
//!     └─ Touch* ──────────▶ TouchAdapter ──────────▶ PointerThrottle ──┘
//! ```
//!
//! # Architecture
//!
//! This use case depends only on traits (`Transport`, `SettingsStore`,
//! `UiNotifier`) and on `relay-core` types.  Infrastructure implementations
//! are injected at construction time, so the whole pipeline runs in unit
//! tests against recording doubles and mocks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use relay_core::{CanonicalCode, KeyboardLayout, KeystrokeEvent, RawKeyEvent, RawPointerEvent};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::keystroke_queue::{KeystrokeQueue, KEYSTROKE_TICK};
use super::modifier_tracker::ModifierStateTracker;
use super::pointer_throttle::{PointerSink, PointerThrottle, DEFAULT_THROTTLE_INTERVAL};
use super::touch::{TouchAdapter, LONG_PRESS_THRESHOLD};
use super::transport::{ForwardError, Transport};
use crate::infrastructure::input_source::RawInputEvent;

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Persistent operator preferences.
#[cfg_attr(test, mockall::automock)]
pub trait SettingsStore: Send + Sync {
    fn get_cursor_preference(&self) -> String;
    fn set_cursor_preference(&self, cursor: &str);
    fn is_keystroke_history_enabled(&self) -> bool;
    fn enable_keystroke_history(&self);
    fn disable_keystroke_history(&self);
}

/// Identifies one keystroke history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryId(pub Uuid);

impl HistoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Delivery status shown next to a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystrokeStatus {
    Succeeded,
    Failed,
}

/// Where the session reports what happened to the operator.
#[cfg_attr(test, mockall::automock)]
pub trait UiNotifier: Send + Sync {
    /// Adds a history record and returns its id.
    fn record_keystroke(&self, label: &str) -> HistoryId;
    fn update_keystroke_status(&self, id: HistoryId, status: KeystrokeStatus);
    fn report_error(&self, title: &str, details: &str);
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Tunables for a session.  Defaults are the production values.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Remote keyboard layout used for paste playback.
    pub layout: KeyboardLayout,
    pub keystroke_tick: Duration,
    pub initial_pointer_interval: Duration,
    pub long_press: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            layout: KeyboardLayout::default(),
            keystroke_tick: KEYSTROKE_TICK,
            initial_pointer_interval: DEFAULT_THROTTLE_INTERVAL,
            long_press: LONG_PRESS_THRESHOLD,
        }
    }
}

/// Completes with the delivery outcome of one keystroke or release.
pub type Delivery = JoinHandle<Result<(), ForwardError>>;

/// The input pipeline of one operator session.
pub struct ForwardInputUseCase {
    tracker: ModifierStateTracker,
    keystrokes: KeystrokeQueue,
    pointer: PointerThrottle,
    touch: TouchAdapter,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn UiNotifier>,
    layout: KeyboardLayout,
}

impl ForwardInputUseCase {
    /// Starts a session.  Must be called from within a tokio runtime.
    pub fn new(
        transport: Arc<dyn Transport>,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn UiNotifier>,
        options: SessionOptions,
    ) -> Self {
        let keystrokes = KeystrokeQueue::with_tick(Arc::clone(&transport), options.keystroke_tick);
        let pointer = PointerThrottle::with_interval(transport, options.initial_pointer_interval);
        let touch = TouchAdapter::with_threshold(Arc::new(pointer.handle()), options.long_press);
        Self {
            tracker: ModifierStateTracker::new(),
            keystrokes,
            pointer,
            touch,
            settings,
            notifier,
            layout: options.layout,
        }
    }

    /// Routes one raw event through the pipeline.
    ///
    /// Delivery outcomes are reported through the [`UiNotifier`] and logs;
    /// use the per-event methods to await them.
    pub fn handle_event(&mut self, event: RawInputEvent) {
        match event {
            RawInputEvent::KeyDown(raw) => {
                self.key_down(&raw);
            }
            RawInputEvent::KeyUp(raw) => {
                self.key_up(&raw);
            }
            RawInputEvent::PointerDown(raw) => self.pointer.button_down(&raw),
            RawInputEvent::PointerUp(raw) => self.pointer.button_up(&raw),
            RawInputEvent::PointerMove(raw) => self.pointer.motion(&raw),
            RawInputEvent::Wheel(raw) => self.pointer.wheel(&raw),
            RawInputEvent::TouchStart { touches, target } => {
                self.touch.touch_start(touches, target)
            }
            RawInputEvent::TouchMove { touches } => self.touch.touch_move(touches),
            RawInputEvent::TouchEnd => self.touch.touch_end(),
            RawInputEvent::TouchCancel => self.touch.touch_cancel(),
            RawInputEvent::Blur => {
                self.release_all_modifiers();
            }
            RawInputEvent::Paste { text } => {
                self.paste(&text);
            }
        }
    }

    // ── Keyboard ──

    /// Forwards a key press.  `None` when the event is an IME placeholder.
    pub fn key_down(&mut self, raw: &RawKeyEvent) -> Option<Delivery> {
        if raw.is_ime_placeholder() {
            debug!(key = %raw.key, "dropping IME composition key-down");
            return None;
        }
        let code = self.tracker.on_press(raw);
        let event = self.tracker.keystroke_for(&raw.key, code);
        Some(self.forward_keystroke(event))
    }

    /// Records a key release and queues a release signal.
    pub fn key_up(&mut self, raw: &RawKeyEvent) -> Option<Delivery> {
        if raw.is_ime_placeholder() {
            debug!(key = %raw.key, "dropping IME composition key-up");
            return None;
        }
        self.tracker.on_release(raw);
        Some(self.forward_release())
    }

    /// Synthesizes a release for every modifier still held.
    ///
    /// Used when the input surface loses focus: the real releases will be
    /// delivered elsewhere and never reach the session.
    pub fn release_all_modifiers(&mut self) -> Vec<Delivery> {
        let mut held: Vec<CanonicalCode> =
            self.tracker.all_pressed_modifiers().into_iter().collect();
        held.sort();
        held.into_iter()
            .filter_map(|code| {
                debug!(%code, "releasing modifier held across focus loss");
                self.key_up(&RawKeyEvent {
                    code: code.to_string(),
                    key: String::new(),
                    key_code: 0,
                    modifiers: Default::default(),
                })
            })
            .collect()
    }

    /// Types `text` on the remote machine, one keystroke and release per
    /// character, using the session's keyboard layout.
    ///
    /// `\r\n` and lone `\r` line endings are typed as a single `Enter`.
    pub fn paste(&mut self, text: &str) -> Vec<Delivery> {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut deliveries = Vec::with_capacity(text.chars().count() * 2);
        for character in text.chars() {
            let (code, shift) = self.layout.lookup(character).unwrap_or_else(|| {
                debug!(
                    ?character,
                    layout = %self.layout,
                    "no key for character; passing it through"
                );
                (CanonicalCode::passthrough(character.to_string()), false)
            });
            let held = shift.then_some(CanonicalCode::SHIFT_LEFT);
            let event = KeystrokeEvent::new(character.to_string(), code, held.iter());
            deliveries.push(self.forward_keystroke(event));
            deliveries.push(self.forward_release());
        }
        deliveries
    }

    /// Returns whether `code` is tracked as held.
    pub fn is_pressed(&self, code: &CanonicalCode) -> bool {
        self.tracker.is_pressed(code)
    }

    pub fn layout(&self) -> KeyboardLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: KeyboardLayout) {
        self.layout = layout;
    }

    // ── Pointer ──

    pub fn pointer_down(&self, raw: &RawPointerEvent) {
        self.pointer.button_down(raw);
    }

    pub fn pointer_up(&self, raw: &RawPointerEvent) {
        self.pointer.button_up(raw);
    }

    pub fn pointer_move(&self, raw: &RawPointerEvent) {
        self.pointer.motion(raw);
    }

    pub fn wheel(&self, raw: &RawPointerEvent) {
        self.pointer.wheel(raw);
    }

    /// The pointer throttle's current adaptive interval.
    pub fn pointer_interval(&self) -> Duration {
        self.pointer.current_interval()
    }

    // ── Settings ──

    pub fn cursor_preference(&self) -> String {
        self.settings.get_cursor_preference()
    }

    pub fn set_cursor_preference(&self, cursor: &str) {
        self.settings.set_cursor_preference(cursor);
    }

    pub fn set_keystroke_history_enabled(&self, enabled: bool) {
        if enabled {
            self.settings.enable_keystroke_history();
        } else {
            self.settings.disable_keystroke_history();
        }
    }

    /// Stops accepting input and waits until queued input has been sent.
    pub async fn shutdown(self) {
        // The touch adapter holds a pointer handle; it must go first so the
        // throttle's channel can close.
        self.touch.shutdown().await;
        self.pointer.shutdown().await;
        self.keystrokes.shutdown().await;
    }

    // ── Helpers ──

    fn forward_keystroke(&self, event: KeystrokeEvent) -> Delivery {
        let history = if self.settings.is_keystroke_history_enabled() {
            Some(self.notifier.record_keystroke(&keystroke_label(&event)))
        } else {
            None
        };
        let code = event.code.clone();
        let ack = self.keystrokes.enqueue(event);
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            let outcome = ack.await;
            if let Some(id) = history {
                let status = match outcome {
                    Ok(()) => KeystrokeStatus::Succeeded,
                    Err(_) => KeystrokeStatus::Failed,
                };
                notifier.update_keystroke_status(id, status);
            }
            if let Err(err) = &outcome {
                warn!(%code, "failed to forward keystroke: {err}");
                notifier.report_error("Failed to forward keystroke", &format!("{code}: {err}"));
            }
            outcome
        })
    }

    fn forward_release(&self) -> Delivery {
        let ack = self.keystrokes.enqueue_release();
        tokio::spawn(async move {
            let outcome = ack.await;
            if let Err(err) = &outcome {
                warn!("failed to forward key release: {err}");
            }
            outcome
        })
    }
}

/// History label: held modifiers, then the key, e.g. `Ctrl + Shift + T`.
fn keystroke_label(event: &KeystrokeEvent) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if event.ctrl_left || event.ctrl_right {
        parts.push("Ctrl");
    }
    if event.shift_left || event.shift_right {
        parts.push("Shift");
    }
    if event.alt_left || event.alt_right {
        parts.push("Alt");
    }
    if event.meta_left || event.meta_right {
        parts.push("Meta");
    }
    let key = match event.key.as_str() {
        "" => event.code.as_str(),
        " " => "Space",
        "\n" => "Enter",
        "\t" => "Tab",
        key => key,
    };
    parts.push(key);
    parts.join(" + ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
