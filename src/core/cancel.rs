//! Cooperative cancellation. A sticky flag plus wakers for parked threads.
//!
//! A token is checked at exactly two points of an operation: before the
//! scheduler mutex is taken, and on every resumption from a gate wait.
//! Once an operation has been admitted and its body runs, the token is no
//! longer consulted; the body and the exit protocol always complete.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// The operation was cancelled before its body began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Something a cancelled token must rouse so it can observe the flag.
pub(crate) trait Wake: Send + Sync {
    fn wake(&self);
}

struct Inner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    wakers: Mutex<Vec<(u64, Arc<dyn Wake>)>>,
}

/// Cloneable cancellation handle shared between a caller and the thread
/// it wants to interrupt.
///
/// `cancel` is idempotent and sticky: once set, every registered waiter
/// is roused and every later [`checkpoint`](Self::checkpoint) fails.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
                wakers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Request cancellation and rouse every registered waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        // Snapshot first: a waker takes its scheduler's mutex, and that
        // mutex may be held by a thread currently registering here.
        let snapshot: Vec<Arc<dyn Wake>> = {
            let wakers = lock(&self.inner.wakers);
            wakers.iter().map(|(_, w)| Arc::clone(w)).collect()
        };
        for waker in snapshot {
            waker.wake();
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Fail fast if cancellation has been requested.
    #[inline]
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Register a waker for the duration of a gate wait. Dropping the
    /// guard removes the registration.
    pub(crate) fn watch(&self, waker: Arc<dyn Wake>) -> WatchGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.wakers).push((id, waker));
        WatchGuard {
            inner: Arc::clone(&self.inner),
            id,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

pub(crate) struct WatchGuard {
    inner: Arc<Inner>,
    id: u64,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        lock(&self.inner.wakers).retain(|(id, _)| *id != self.id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct CountingWaker(AtomicU32);

    impl Wake for CountingWaker {
        fn wake(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_checkpoint_observes_cancellation() {
        let token = CancelToken::new();
        assert!(token.checkpoint().is_ok());
        token.cancel();
        assert_eq!(token.checkpoint(), Err(Cancelled));
    }

    #[test]
    fn test_cancel_shared_across_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_registered_waker_is_roused() {
        let token = CancelToken::new();
        let waker = Arc::new(CountingWaker(AtomicU32::new(0)));
        let guard = token.watch(waker.clone());
        token.cancel();
        assert_eq!(waker.0.load(Ordering::SeqCst), 1);
        drop(guard);
        token.cancel();
        assert_eq!(waker.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_watch_guard_unregisters() {
        let token = CancelToken::new();
        let waker = Arc::new(CountingWaker(AtomicU32::new(0)));
        drop(token.watch(waker.clone()));
        token.cancel();
        assert_eq!(waker.0.load(Ordering::SeqCst), 0);
    }
}
