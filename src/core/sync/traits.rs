/*!
 * Synchronization Traits
 *
 * Core abstractions for the wait/notify protocol.
 *
 * # Design: Trait Seam Between Token and Queue
 *
 * A cancellation token does not know which queue (or which element type) a
 * parked consumer belongs to. The queue hands the token a type-erased
 * `Arc<dyn Wake>` instead, and the token calls it when it fires.
 */

/// Result of a wake operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Something a cancellation watcher can wake
///
/// Implementations must acquire the lock that guards the waiter's predicate
/// before notifying, otherwise a waiter that has checked the predicate but
/// not yet parked misses the wake-up.
pub trait Wake: Send + Sync {
    /// Wake every waiter so each re-evaluates its own condition
    fn wake(&self) -> WakeResult;
}
