//! Observer sets with add/remove/notify.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// A registered callback. Identity is the `Arc` allocation, so registering
/// the same `Observer` twice is a no-op and removal needs the same handle.
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An ordered set of callbacks notified with a borrowed value.
///
/// Callbacks run synchronously, in registration order, outside the internal
/// lock: a callback may add or remove observers (changes apply from the next
/// notification on).
pub struct Observers<T: ?Sized> {
    entries: Mutex<Vec<Observer<T>>>,
}

impl<T: ?Sized> Observers<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Registers `observer`. Returns `false` if it was already registered.
    pub fn add(&self, observer: Observer<T>) -> bool {
        let mut entries = self.entries.lock();
        if entries.iter().any(|existing| Arc::ptr_eq(existing, &observer)) {
            return false;
        }
        entries.push(observer);
        true
    }

    /// Unregisters `observer`. Returns `false` if it was not registered.
    pub fn remove(&self, observer: &Observer<T>) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|existing| !Arc::ptr_eq(existing, observer));
        entries.len() != before
    }

    /// Invokes every registered observer with `value`.
    pub fn notify(&self, value: &T) {
        let entries = self.entries.lock().clone();
        for observer in entries {
            observer(value);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T: ?Sized> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.len())
            .finish()
    }
}
