//! Thread-safe counter for acknowledgement correlation ids.
//!
//! Every keystroke and pointer request carries a `request_id`; the peer echoes
//! it in its `Ack`, which is how the transport matches acknowledgements to
//! the requests still waiting for them.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing, lock-free request-id generator.
///
/// Ids start at 0 and wrap at `u64::MAX` without panicking.
///
/// # Examples
///
/// ```rust
/// use relay_core::protocol::RequestIdCounter;
///
/// let counter = RequestIdCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RequestIdCounter {
    inner: AtomicU64,
}

impl RequestIdCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Returns the next id.
    ///
    /// `Relaxed` is enough: ids only need to be unique, they do not order
    /// any other memory access.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the next id that would be handed out, without consuming it.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_request_ids_start_at_zero_and_increase() {
        let counter = RequestIdCounter::new();
        let ids: Vec<u64> = (0..5).map(|_| counter.next()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_request_ids_wrap_at_u64_max() {
        // Arrange
        let counter = RequestIdCounter {
            inner: AtomicU64::new(u64::MAX),
        };

        // Act / Assert
        assert_eq!(counter.next(), u64::MAX);
        assert_eq!(counter.next(), 0);
    }

    #[test]
    fn test_request_ids_are_unique_across_threads() {
        // Arrange
        let counter = Arc::new(RequestIdCounter::new());

        // Act
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || (0..500).map(|_| c.next()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        // Assert
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 2000);
    }

    #[test]
    fn test_current_does_not_consume() {
        let counter = RequestIdCounter::new();
        counter.next();
        assert_eq!(counter.current(), 1);
        assert_eq!(counter.next(), 1);
    }
}
