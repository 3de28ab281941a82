//! Integration tests for the coordination primitives under real task
//! scheduling.
//!
//! Tasks are spawned on the current-thread test runtime; the helpers below
//! yield until each spawned task has reached its suspension point so that
//! arrival order is deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::Mutex;
use playroom_sync::{MutexLock, Signal};

// =========================================================================
// Helpers
// =========================================================================

/// Yields until `lock` has `expected` queued acquirers.
async fn until_queued(lock: &MutexLock, expected: usize) {
    while lock.queued() < expected {
        tokio::task::yield_now().await;
    }
}

// =========================================================================
// MutexLock
// =========================================================================

#[tokio::test]
async fn test_lock_grants_in_arrival_order() {
    let lock = Arc::new(MutexLock::new());
    let order = Arc::new(Mutex::new(Vec::new()));

    lock.acquire().await;

    let mut handles = Vec::new();
    for i in 0..5 {
        let task_lock = Arc::clone(&lock);
        let order = Arc::clone(&order);
        handles.push(tokio::spawn(async move {
            task_lock.acquire().await;
            order.lock().push(i);
            tokio::task::yield_now().await;
            task_lock.release();
        }));
        until_queued(&lock, i + 1).await;
    }

    lock.release();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn test_lock_has_at_most_one_holder() {
    let lock = Arc::new(MutexLock::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let lock = Arc::clone(&lock);
        let inside = Arc::clone(&inside);
        let max_inside = Arc::clone(&max_inside);
        handles.push(tokio::spawn(async move {
            lock.run(|| async {
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            })
            .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn test_release_resumes_exactly_the_waiter() {
    let lock = Arc::new(MutexLock::new());

    // A: lock was free, so acquisition completes without suspending.
    assert!(lock.acquire().now_or_never().is_some());

    // B: contended, suspends.
    let b_holds = Arc::new(AtomicUsize::new(0));
    let b = {
        let lock = Arc::clone(&lock);
        let b_holds = Arc::clone(&b_holds);
        tokio::spawn(async move {
            lock.acquire().await;
            b_holds.store(1, Ordering::SeqCst);
        })
    };
    until_queued(&lock, 1).await;
    assert_eq!(b_holds.load(Ordering::SeqCst), 0);

    // A releases: B resumes and now holds the lock.
    lock.release();
    b.await.unwrap();
    assert_eq!(b_holds.load(Ordering::SeqCst), 1);
    assert!(lock.is_locked());
    assert_eq!(lock.queued(), 0);
}

#[tokio::test]
async fn test_run_releases_after_error() {
    let lock = MutexLock::new();

    let result: Result<(), &str> = lock.run(|| async { Err("boom") }).await;

    assert_eq!(result, Err("boom"));
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn test_run_releases_when_section_panics() {
    let lock = Arc::new(MutexLock::new());

    let task = {
        let lock = Arc::clone(&lock);
        tokio::spawn(async move {
            lock.run(|| async {
                if lock.is_locked() {
                    panic!("section failed");
                }
            })
            .await
        })
    };

    assert!(task.await.is_err());
    assert!(!lock.is_locked());
}

#[tokio::test(start_paused = true)]
async fn test_run_releases_when_cancelled() {
    let lock = MutexLock::new();

    let timed_out = tokio::time::timeout(
        Duration::from_millis(10),
        lock.run(|| tokio::time::sleep(Duration::from_secs(60))),
    )
    .await;

    assert!(timed_out.is_err());
    assert!(!lock.is_locked());
}

// =========================================================================
// Signal
// =========================================================================

#[tokio::test]
async fn test_signal_resumes_every_waiter_once() {
    let signal = Arc::new(Signal::new());
    let resumed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let signal = Arc::clone(&signal);
        let resumed = Arc::clone(&resumed);
        handles.push(tokio::spawn(async move {
            signal.wait().await;
            resumed.fetch_add(1, Ordering::SeqCst);
        }));
    }
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
    assert_eq!(resumed.load(Ordering::SeqCst), 0);

    signal.open();
    signal.open();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(resumed.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_signal_wait_after_open_is_immediate() {
    let signal = Signal::new();
    signal.open();

    assert!(signal.wait().now_or_never().is_some());
    assert!(signal.wait().now_or_never().is_some());
}
