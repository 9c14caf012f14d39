/*!
 * Cancellation Tokens
 *
 * Caller-supplied handles that abort a blocking wait, either explicitly or
 * when a deadline passes. Tokens form a tree: cancelling a parent cancels
 * every live descendant, a child's effective deadline is never later than
 * its parent's, and cancelling a child leaves its parent and siblings alone.
 *
 * # Waking parked waiters
 *
 * Deadlines need no helper: a waiter parks with `wait_until(deadline)`.
 * Explicit cancellation has to reach into a parked wait, so a waiter
 * registers a [`Wake`] watcher for the duration of its wait. `cancel()`
 * records the reason, detaches all watchers under the token lock, releases
 * that lock and only then wakes them. Waiters hold their queue lock while
 * registering and retiring watchers, so the lock order is always
 * queue lock -> token lock.
 */

use super::traits::Wake;
use crate::core::errors::CancelError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::trace;

struct TokenState {
    reason: Option<CancelError>,
    watchers: Vec<(u64, Arc<dyn Wake>)>,
    next_watcher: u64,
    children: Vec<Weak<TokenInner>>,
}

struct TokenInner {
    deadline: Option<Instant>,
    state: Mutex<TokenState>,
}

/// Cancellation token with optional deadline
///
/// Cloning yields another handle to the same token; any handle may cancel.
///
/// # Examples
///
/// ```
/// use dedup_queue::{CancelError, CancelToken};
/// use std::time::Duration;
///
/// let parent = CancelToken::new();
/// let child = parent.child_with_timeout(Duration::from_secs(60));
///
/// parent.cancel();
/// assert_eq!(child.err(), Some(CancelError::Cancelled));
/// ```
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    /// Create a root token that fires only when cancelled explicitly
    pub fn new() -> Self {
        Self::root(None)
    }

    /// Create a root token that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::root(Instant::now().checked_add(timeout))
    }

    /// Create a root token that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::root(Some(deadline))
    }

    /// Derive a child that inherits this token's cancellation and deadline
    pub fn child(&self) -> Self {
        self.derive(self.inner.deadline)
    }

    /// Derive a child that additionally expires after `timeout`
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.child_with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Derive a child that additionally expires at `deadline`
    ///
    /// The effective deadline is the earlier of `deadline` and the parent's.
    pub fn child_with_deadline(&self, deadline: Instant) -> Self {
        let effective = match self.inner.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        self.derive(Some(effective))
    }

    /// Cancel this token and all of its descendants
    ///
    /// Idempotent. A token whose deadline already passed keeps reporting
    /// `DeadlineExceeded`.
    pub fn cancel(&self) {
        self.fire(CancelError::Cancelled);
    }

    /// Reports why the token fired, or `None` while it is still live
    pub fn err(&self) -> Option<CancelError> {
        let mut state = self.inner.state.lock();
        if state.reason.is_none() && self.deadline_passed() {
            state.reason = Some(CancelError::DeadlineExceeded);
        }
        state.reason
    }

    /// Check whether the token has fired for either reason
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Effective deadline, if any
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline; `None` when the token has no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Register `waker` to be called on explicit cancellation
    ///
    /// Returns `None` if the token has already fired; the caller should
    /// consult [`err`](Self::err) instead of waiting. Dropping the returned
    /// guard retires the watcher.
    pub(crate) fn watch(&self, waker: Arc<dyn Wake>) -> Option<WatchGuard> {
        let mut state = self.inner.state.lock();
        if state.reason.is_some() || self.deadline_passed() {
            return None;
        }

        let id = state.next_watcher;
        state.next_watcher += 1;
        state.watchers.push((id, waker));

        Some(WatchGuard {
            token: self.clone(),
            id,
        })
    }

    fn root(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                deadline,
                state: Mutex::new(TokenState {
                    reason: None,
                    watchers: Vec::new(),
                    next_watcher: 0,
                    children: Vec::new(),
                }),
            }),
        }
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let child = Self::root(deadline);

        let mut state = self.inner.state.lock();
        match state.reason {
            Some(reason) => {
                child.inner.state.lock().reason = Some(reason);
            }
            None => {
                state.children.retain(|c| c.strong_count() > 0);
                state.children.push(Arc::downgrade(&child.inner));
            }
        }

        child
    }

    fn fire(&self, reason: CancelError) {
        let (watchers, children) = {
            let mut state = self.inner.state.lock();
            if state.reason.is_some() {
                return;
            }
            state.reason = Some(if self.deadline_passed() {
                CancelError::DeadlineExceeded
            } else {
                reason
            });
            (
                std::mem::take(&mut state.watchers),
                std::mem::take(&mut state.children),
            )
        };

        if !watchers.is_empty() {
            trace!(watchers = watchers.len(), "cancellation token fired, waking watchers");
        }
        for (_, waker) in watchers {
            waker.wake();
        }

        for child in children.iter().filter_map(Weak::upgrade) {
            CancelToken { inner: child }.fire(reason);
        }
    }

    #[inline]
    fn deadline_passed(&self) -> bool {
        self.inner.deadline.is_some_and(|d| Instant::now() >= d)
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
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}

/// Registration of a cancellation watcher; retires it on drop
pub(crate) struct WatchGuard {
    token: CancelToken,
    id: u64,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        let mut state = self.token.inner.state.lock();
        state.watchers.retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
impl CancelToken {
    pub(crate) fn watcher_count(&self) -> usize {
        self.inner.state.lock().watchers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::WakeResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Default)]
    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(&self) -> WakeResult {
            self.0.fetch_add(1, Ordering::SeqCst);
            WakeResult::Woken(1)
        }
    }

    #[test]
    fn test_new_token_is_live() {
        let token = CancelToken::new();
        assert_eq!(token.err(), None);
        assert!(!token.is_cancelled());
        assert_eq!(token.deadline(), None);
        assert_eq!(token.remaining(), None);
    }

    #[test]
    fn test_cancel_is_sticky_and_idempotent() {
        let token = CancelToken::new();
        let other = token.clone();

        other.cancel();
        token.cancel();

        assert_eq!(token.err(), Some(CancelError::Cancelled));
        assert_eq!(other.err(), Some(CancelError::Cancelled));
    }

    #[test]
    fn test_deadline_expires() {
        let token = CancelToken::with_timeout(Duration::from_millis(20));
        assert_eq!(token.err(), None);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(token.err(), Some(CancelError::DeadlineExceeded));
        assert_eq!(token.remaining(), Some(Duration::ZERO));

        // Cancelling after expiry does not rewrite the reason
        token.cancel();
        assert_eq!(token.err(), Some(CancelError::DeadlineExceeded));
    }

    #[test]
    fn test_past_deadline_is_already_expired() {
        let token = CancelToken::with_deadline(Instant::now());
        assert_eq!(token.err(), Some(CancelError::DeadlineExceeded));
    }

    #[test]
    fn test_parent_cancel_reaches_children() {
        let parent = CancelToken::new();
        let child = parent.child();
        let grandchild = child.child();

        parent.cancel();

        assert_eq!(child.err(), Some(CancelError::Cancelled));
        assert_eq!(grandchild.err(), Some(CancelError::Cancelled));
    }

    #[test]
    fn test_child_cancel_leaves_parent_and_siblings() {
        let parent = CancelToken::new();
        let a = parent.child();
        let b = parent.child();

        a.cancel();

        assert_eq!(a.err(), Some(CancelError::Cancelled));
        assert_eq!(parent.err(), None);
        assert_eq!(b.err(), None);
    }

    #[test]
    fn test_child_of_cancelled_parent_starts_cancelled() {
        let parent = CancelToken::new();
        parent.cancel();
        assert_eq!(parent.child().err(), Some(CancelError::Cancelled));
    }

    #[test]
    fn test_child_deadline_never_exceeds_parent() {
        let parent = CancelToken::with_timeout(Duration::from_millis(100));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let sooner = parent.child_with_timeout(Duration::from_millis(10));
        assert!(sooner.deadline() < parent.deadline());
    }

    #[test]
    fn test_watchers_fire_once_on_cancel() {
        let token = CancelToken::new();
        let waker = Arc::new(CountingWaker::default());

        let guard = token.watch(waker.clone());
        assert!(guard.is_some());
        assert_eq!(token.watcher_count(), 1);

        token.cancel();
        token.cancel();

        assert_eq!(waker.0.load(Ordering::SeqCst), 1);
        assert_eq!(token.watcher_count(), 0);
        drop(guard);
    }

    #[test]
    fn test_watch_guard_retires_watcher() {
        let token = CancelToken::new();
        let waker = Arc::new(CountingWaker::default());

        drop(token.watch(waker.clone()));
        assert_eq!(token.watcher_count(), 0);

        token.cancel();
        assert_eq!(waker.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_watch_on_fired_token_is_refused() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.watch(Arc::new(CountingWaker::default())).is_none());

        let expired = CancelToken::with_deadline(Instant::now());
        assert!(expired.watch(Arc::new(CountingWaker::default())).is_none());
    }

    #[test]
    fn test_parent_cancel_wakes_child_watchers() {
        let parent = CancelToken::new();
        let child = parent.child();
        let waker = Arc::new(CountingWaker::default());

        let _guard = child.watch(waker.clone());
        parent.cancel();

        assert_eq!(waker.0.load(Ordering::SeqCst), 1);
    }
}
