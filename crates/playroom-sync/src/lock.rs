//! Cooperative FIFO mutual exclusion over async sections.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::FifoQueue;

/// A lock held across `.await` points, granting contending acquirers in
/// strict arrival order.
///
/// - [`acquire`](Self::acquire) takes the lock immediately when it is free
///   and nobody is queued; otherwise it joins the back of the wait list.
/// - [`release`](Self::release) hands the lock to the longest-waiting
///   acquirer, or marks it free when the list is empty. Releasing a lock
///   that is not held is a no-op.
/// - [`run`](Self::run) wraps a section in acquire → invoke → release,
///   releasing on every exit path.
///
/// The lock does not track who holds it; `release` trusts the caller.
#[derive(Debug, Default)]
pub struct MutexLock {
    state: Mutex<LockState>,
}

#[derive(Debug, Default)]
struct LockState {
    held: bool,
    waiters: FifoQueue<oneshot::Sender<()>>,
}

impl MutexLock {
    /// Creates a free lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while some caller holds the lock.
    pub fn is_locked(&self) -> bool {
        self.state.lock().held
    }

    /// Number of acquirers waiting in line.
    pub fn queued(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Takes the lock, suspending behind earlier acquirers when contended.
    pub async fn acquire(&self) {
        let granted = {
            let mut state = self.state.lock();
            if !state.held && state.waiters.is_empty() {
                state.held = true;
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };

        let mut pending = PendingAcquire {
            lock: self,
            granted: Some(granted),
        };
        pending.wait().await;
    }

    /// Hands the lock to the next waiter, or frees it.
    pub fn release(&self) {
        let mut state = self.state.lock();
        if !state.held {
            return;
        }
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(()).is_ok() {
                tracing::trace!(queued = state.waiters.len(), "lock handed over");
                return;
            }
            // That acquirer was dropped while queued; try the next one.
        }
        state.held = false;
    }

    /// Runs `section` while holding the lock.
    ///
    /// The lock is released when the section completes, returns an error,
    /// panics, or is dropped mid-flight.
    pub async fn run<F, Fut, T>(&self, section: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        let _held = Held(self);
        section().await
    }
}

/// Releases the lock on drop.
struct Held<'a>(&'a MutexLock);

impl Drop for Held<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// A queued acquirer. If dropped after the lock was handed to it but before
/// it observed the grant, it passes the lock on.
struct PendingAcquire<'a> {
    lock: &'a MutexLock,
    granted: Option<oneshot::Receiver<()>>,
}

impl PendingAcquire<'_> {
    async fn wait(&mut self) {
        if let Some(granted) = self.granted.as_mut() {
            // The sender lives in the lock, which outlives this borrow.
            let _ = granted.await;
        }
        self.granted = None;
    }
}

impl Drop for PendingAcquire<'_> {
    fn drop(&mut self) {
        if let Some(mut granted) = self.granted.take() {
            granted.close();
            if granted.try_recv().is_ok() {
                self.lock.release();
            }
        }
    }
}
