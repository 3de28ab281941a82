//! One-shot broadcast gate.

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// A gate that many tasks can wait on until a single producer opens it.
///
/// Once [`open`](Self::open) has been called, every pending waiter resumes
/// exactly once and every later [`wait`](Self::wait) returns without
/// suspending. Waiters are independent observers; no ordering is promised
/// among them.
///
/// ```text
///   closed ──(open)──→ opened
///     ↑                   │
///     └──────(close)──────┘   (reset for reuse, never mixed with waiters)
/// ```
#[derive(Debug, Default)]
pub struct Signal {
    state: Mutex<SignalState>,
}

#[derive(Debug, Default)]
struct SignalState {
    opened: bool,
    waiters: Vec<oneshot::Sender<()>>,
}

impl Signal {
    /// Creates a closed signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a signal that is already open.
    pub fn opened() -> Self {
        let signal = Self::new();
        signal.open();
        signal
    }

    /// Returns `true` once the signal has been opened.
    pub fn is_open(&self) -> bool {
        self.state.lock().opened
    }

    /// Opens the signal and resumes every currently queued waiter.
    ///
    /// Idempotent: opening an already-open signal does nothing.
    pub fn open(&self) {
        let waiters = {
            let mut state = self.state.lock();
            if state.opened {
                return;
            }
            state.opened = true;
            std::mem::take(&mut state.waiters)
        };

        tracing::trace!(waiters = waiters.len(), "signal opened");
        for waiter in waiters {
            // A dropped receiver means the waiter went away; nothing to resume.
            let _ = waiter.send(());
        }
    }

    /// Resets the flag so the signal can be reused.
    ///
    /// Must not race with pending waiters: anyone still queued stays queued
    /// until the next `open`.
    pub fn close(&self) {
        self.state.lock().opened = false;
    }

    /// Suspends until the signal is open. Returns immediately if it already is.
    pub async fn wait(&self) {
        let resumed = {
            let mut state = self.state.lock();
            if state.opened {
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            rx
        };

        // The sender lives inside `self`, which outlives this borrow.
        let _ = resumed.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::FutureExt;

    #[test]
    fn test_new_signal_is_closed() {
        let signal = Signal::new();
        assert!(!signal.is_open());
        assert!(signal.wait().now_or_never().is_none());
    }

    #[test]
    fn test_opened_signal_does_not_suspend() {
        let signal = Signal::opened();
        assert!(signal.is_open());
        assert!(signal.wait().now_or_never().is_some());
    }

    #[test]
    fn test_open_is_idempotent() {
        let signal = Signal::new();
        signal.open();
        signal.open();
        assert!(signal.is_open());
        assert!(signal.state.lock().waiters.is_empty());
    }

    #[test]
    fn test_close_resets_flag() {
        let signal = Signal::opened();
        signal.close();
        assert!(!signal.is_open());
        assert!(signal.wait().now_or_never().is_none());
    }
}
