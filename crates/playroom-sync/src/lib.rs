//! Async coordination primitives for Playroom.
//!
//! Every asynchronous flow in the client is built on a handful of small
//! primitives:
//!
//! - [`Signal`]: a one-shot broadcast gate. Many tasks wait, one opens it,
//!   and from then on it stays open.
//! - [`MutexLock`]: cooperative mutual exclusion over async sections, with
//!   strict FIFO admission among contending acquirers.
//! - [`FifoQueue`]: the ordered double-ended sequence backing the lock's
//!   wait list.
//! - [`Observers`]: a set of callbacks with add/remove/notify, shared by
//!   per-room and roster-level publishers.
//!
//! None of these support cancellation or timeouts: a pending `wait()` or
//! `acquire()` stays pending until it is satisfied. Dropping a pending
//! future is tolerated and never leaves the lock held.
//!
//! # Integration
//!
//! ```ignore
//! let lock = MutexLock::new();
//! let value = lock.run(|| async { apply_update().await }).await;
//! ```

mod lock;
mod observers;
mod queue;
mod signal;

pub use lock::MutexLock;
pub use observers::{Observer, Observers};
pub use queue::FifoQueue;
pub use signal::Signal;
