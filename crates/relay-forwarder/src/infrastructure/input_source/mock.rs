//! Mock input source for testing.
//!
//! Lets tests inject synthetic [`RawInputEvent`]s as if they had been read
//! from the operator's input surface.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::{InputSource, RawInputEvent, SourceError};

/// An [`InputSource`] fed by [`inject_event`](MockInputSource::inject_event).
pub struct MockInputSource {
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<RawInputEvent>>>>,
}

impl MockInputSource {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Injects a synthetic event.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: RawInputEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(sender) => sender
                .send(event)
                .expect("receiver has been dropped; keep the channel from start()"),
            None => panic!("MockInputSource::inject_event called before start()"),
        }
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RawInputEvent>, SourceError> {
        let mut guard = self.sender.lock().expect("lock poisoned");
        if guard.is_some() {
            return Err(SourceError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        *self.sender.lock().expect("lock poisoned") = None;
    }
}
