/*!
 * Condvar-Based Wait Strategy
 *
 * A `parking_lot::Condvar` bound to the caller's mutex, plus bookkeeping:
 * how many threads are parked and how many broadcasts were issued.
 *
 * Both counters are only modified while the associated mutex is held, so a
 * reader holding that mutex sees exact values. Lock-free readers (stats,
 * tests) see a value that may lag by one transition.
 */

use super::traits::WakeResult;
use parking_lot::{Condvar, MutexGuard};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Condition variable with waiter accounting
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
#[derive(Debug, Default)]
pub struct CondvarWait {
    condvar: Condvar,
    waiters: AtomicUsize,
    notifications: AtomicU64,
}

impl CondvarWait {
    pub const fn new() -> Self {
        Self {
            condvar: Condvar::new(),
            waiters: AtomicUsize::new(0),
            notifications: AtomicU64::new(0),
        }
    }

    /// Park on the condvar until notified or until `deadline` passes
    ///
    /// The mutex behind `guard` is released while parked and re-acquired
    /// before returning. Returns `true` if woken by notify (or spuriously),
    /// `false` if the deadline elapsed. Callers must re-check their predicate
    /// either way.
    pub fn wait<T: ?Sized>(&self, guard: &mut MutexGuard<'_, T>, deadline: Option<Instant>) -> bool {
        self.waiters.fetch_add(1, Ordering::Relaxed);

        let timed_out = match deadline {
            Some(deadline) => self.condvar.wait_until(guard, deadline).timed_out(),
            None => {
                self.condvar.wait(guard);
                false
            }
        };

        self.waiters.fetch_sub(1, Ordering::Relaxed);

        !timed_out
    }

    /// Wake all parked waiters
    ///
    /// Must be called with the associated mutex held.
    pub fn wake_all(&self) -> WakeResult {
        let count = self.waiters.load(Ordering::Relaxed);
        if count == 0 {
            return WakeResult::NoWaiters;
        }

        self.notifications.fetch_add(1, Ordering::Relaxed);
        self.condvar.notify_all();
        WakeResult::Woken(count)
    }

    /// Number of threads currently parked
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }

    /// Number of broadcasts issued so far
    #[inline]
    pub fn notification_count(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }
}
