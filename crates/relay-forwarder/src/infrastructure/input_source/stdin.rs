//! Newline-delimited JSON input source.
//!
//! Reads one [`RawInputEvent`] per line.  Blank lines are ignored; malformed
//! lines are logged and skipped so that one bad producer write does not end
//! the session.

use std::sync::Mutex;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{InputSource, RawInputEvent, SourceError};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Reads events from any async byte stream, stdin by default.
pub struct JsonLinesInputSource {
    reader: Mutex<Option<BoxedReader>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl JsonLinesInputSource {
    /// Reads from the process's standard input.
    pub fn stdin() -> Self {
        Self::from_reader(tokio::io::stdin())
    }

    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
            task: Mutex::new(None),
        }
    }
}

/// Decodes one line.  `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<RawInputEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

impl InputSource for JsonLinesInputSource {
    /// Must be called from within a tokio runtime.
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RawInputEvent>, SourceError> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| SourceError::AlreadyStarted)?
            .take()
            .ok_or(SourceError::AlreadyStarted)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            let mut line_no = 0usize;
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        warn!("input stream failed: {err}");
                        break;
                    }
                };
                line_no += 1;
                match parse_line(&line) {
                    Ok(Some(event)) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => warn!(line = line_no, "skipping malformed input event: {err}"),
                }
            }
            debug!(lines = line_no, "input stream ended");
        });

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(task);
        }
        Ok(rx)
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().ok().and_then(|mut slot| slot.take()) {
            task.abort();
        }
    }
}
