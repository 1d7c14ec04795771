//! UI bridge: how the session reports to the operator.
//!
//! The headless forwarder has no window, so [`LogNotifier`] turns every
//! notification into a structured `tracing` event and keeps a bounded
//! in-memory keystroke history.  A graphical front end would implement
//! [`UiNotifier`] itself and render the same records.
//!
//! # History records
//!
//! Each forwarded keystroke gets a [`HistoryEntry`] with status `Pending`;
//! the session later flips it to `Succeeded` or `Failed` once the peer's
//! acknowledgement resolves.  Only the most recent [`HISTORY_CAPACITY`]
//! records are kept.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::application::forward_input::{HistoryId, KeystrokeStatus, UiNotifier};

/// Number of history records retained.
pub const HISTORY_CAPACITY: usize = 100;

/// Status of a history record as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryStatus {
    Pending,
    Succeeded,
    Failed,
}

impl From<KeystrokeStatus> for EntryStatus {
    fn from(status: KeystrokeStatus) -> Self {
        match status {
            KeystrokeStatus::Succeeded => EntryStatus::Succeeded,
            KeystrokeStatus::Failed => EntryStatus::Failed,
        }
    }
}

/// One keystroke history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub label: String,
    pub status: EntryStatus,
}

/// A [`UiNotifier`] that logs and keeps a bounded history.
#[derive(Default)]
pub struct LogNotifier {
    history: Mutex<VecDeque<(HistoryId, HistoryEntry)>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The retained history, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().iter().map(|(_, entry)| entry.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<(HistoryId, HistoryEntry)>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UiNotifier for LogNotifier {
    fn record_keystroke(&self, label: &str) -> HistoryId {
        let id = HistoryId::new();
        let mut history = self.lock();
        if history.len() == HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back((
            id,
            HistoryEntry {
                id: id.to_string(),
                label: label.to_string(),
                status: EntryStatus::Pending,
            },
        ));
        debug!(%id, label, "keystroke recorded");
        id
    }

    fn update_keystroke_status(&self, id: HistoryId, status: KeystrokeStatus) {
        let mut history = self.lock();
        // Records that fell off the end of the history are ignored.
        if let Some((_, entry)) = history.iter_mut().rev().find(|(entry_id, _)| *entry_id == id) {
            entry.status = status.into();
            info!(%id, label = %entry.label, ?status, "keystroke delivery");
        }
    }

    fn report_error(&self, title: &str, details: &str) {
        error!(title, details, "forwarding error");
    }
}
