/*!
 * Blocking Queue
 * FIFO with optional de-duplication whose consumers can wait for items
 *
 * # Wake-up protocol
 *
 * One mutex guards the FIFO state and is the mutex the condvar is bound to.
 * - Producers broadcast only when an element was actually added, and only
 *   once per batch. A rejected duplicate wakes nobody.
 * - A consumer that finds the queue empty parks on the condvar. The park
 *   atomically releases the lock, so a put between the emptiness check and
 *   the park cannot be missed.
 * - After every wake the consumer tries to dequeue first and only then
 *   consults its token, so an unrelated or spurious wake just loops.
 * - Deadlines are honoured by a timed park. Explicit cancellation arrives
 *   through a watcher registered on the token for the duration of the wait;
 *   it takes the queue lock and broadcasts. The watcher is retired when the
 *   wait ends, on every exit path.
 */

use crate::core::errors::{CancelError, TakeResult};
use crate::core::sync::{CancelToken, CondvarWait, Wake, WakeResult};
use crate::queue::config::QueueConfig;
use crate::queue::fifo::FifoState;
use crate::queue::types::QueueStats;
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

struct Shared<T> {
    state: Mutex<FifoState<T>>,
    available: CondvarWait,
}

impl<T: Send> Wake for Shared<T> {
    fn wake(&self) -> WakeResult {
        let _state = self.state.lock();
        self.available.wake_all()
    }
}

/// Blocking, concurrency-safe FIFO queue with optional de-duplication
///
/// Cloning yields another handle to the same queue.
///
/// # Examples
///
/// ```
/// use dedup_queue::{BlockingQueue, CancelToken};
/// use std::thread;
///
/// let queue = BlockingQueue::new(true);
/// let consumer = {
///     let queue = queue.clone();
///     thread::spawn(move || queue.take(&CancelToken::new()))
/// };
///
/// assert!(queue.put("job"));
/// assert_eq!(consumer.join().unwrap(), Ok("job"));
/// ```
pub struct BlockingQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> BlockingQueue<T>
where
    T: Eq + Hash + Clone,
{
    /// Create an empty blocking queue
    pub fn new(dedup: bool) -> Self {
        Self::from_config(QueueConfig::new(dedup))
    }

    /// Create an empty blocking queue with preallocated storage
    pub fn with_capacity(dedup: bool, capacity: usize) -> Self {
        Self::from_config(QueueConfig::new(dedup).with_capacity(capacity))
    }

    pub fn from_config(config: QueueConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(FifoState::new(config)),
                available: CondvarWait::new(),
            }),
        }
    }

    /// Append `value` to the tail
    ///
    /// Returns `false` when de-duplication is enabled and `value` is already
    /// queued. Parked consumers are woken only when the value was added.
    pub fn put(&self, value: T) -> bool {
        let mut state = self.shared.state.lock();
        let added = state.push(value);
        if added {
            self.shared.available.wake_all();
        } else {
            trace!("duplicate value rejected, no wake-up");
        }
        added
    }

    /// Enqueue `values` in order and return how many were added
    ///
    /// Broadcasts once if anything was added.
    pub fn put_many<I>(&self, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut state = self.shared.state.lock();
        let added = state.push_many(values);
        if added > 0 {
            self.shared.available.wake_all();
        }
        added
    }

    /// Remove and return the head without blocking
    pub fn try_take(&self) -> Option<T> {
        self.shared.state.lock().pop()
    }

    /// Clone of the head without removing it
    pub fn peek(&self) -> Option<T> {
        self.shared.state.lock().peek().cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.shared.state.lock().contains(value)
    }

    /// Remove the first occurrence of `value`
    pub fn remove(&self, value: &T) -> bool {
        self.shared.state.lock().remove(value)
    }

    pub fn clear(&self) {
        self.shared.state.lock().clear();
    }

    /// Copy of the contents in FIFO order, independent of the queue
    pub fn snapshot(&self) -> Vec<T> {
        self.shared.state.lock().snapshot()
    }

    pub fn is_dedup(&self) -> bool {
        self.shared.state.lock().is_dedup()
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.shared.state.lock();
        QueueStats {
            length: state.len(),
            dedup: state.is_dedup(),
            waiters: self.shared.available.waiter_count(),
            notifications: self.shared.available.notification_count(),
        }
    }
}

impl<T> BlockingQueue<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    /// Remove and return the head, waiting until one is available
    ///
    /// Returns immediately when an element is queued, even if `token` has
    /// already fired. Otherwise waits until an element arrives or `token`
    /// fires, in which case the token's reason is returned.
    pub fn take(&self, token: &CancelToken) -> TakeResult<T> {
        let mut state = self.shared.state.lock();

        // Fast path
        if let Some(value) = state.pop() {
            return Ok(value);
        }

        let waker: Arc<dyn Wake> = self.shared.clone();
        let Some(_watch) = token.watch(waker) else {
            return Err(token.err().unwrap_or(CancelError::Cancelled));
        };
        let deadline = token.deadline();

        debug!(
            waiters = self.shared.available.waiter_count() + 1,
            "queue empty, consumer parking"
        );

        loop {
            self.shared.available.wait(&mut state, deadline);

            if let Some(value) = state.pop() {
                trace!("consumer resumed with a value");
                return Ok(value);
            }
            if let Some(err) = token.err() {
                debug!(reason = %err, "consumer leaving on cancellation");
                return Err(err);
            }
        }
    }

    /// [`take`](Self::take) with a fresh token that expires after `timeout`
    pub fn take_timeout(&self, timeout: Duration) -> TakeResult<T> {
        self.take(&CancelToken::with_timeout(timeout))
    }
}

impl<T> Clone for BlockingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for BlockingQueue<T>
where
    T: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("BlockingQueue")
            .field("len", &stats.length)
            .field("dedup", &stats.dedup)
            .field("waiters", &stats.waiters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    fn wait_for_waiters<T: Eq + Hash + Clone>(queue: &BlockingQueue<T>, n: usize) {
        let start = Instant::now();
        while queue.stats().waiters < n {
            assert!(start.elapsed() < Duration::from_secs(5), "consumer never parked");
            thread::yield_now();
        }
    }

    #[test]
    fn test_take_fast_path_ignores_fired_token() {
        let queue = BlockingQueue::new(false);
        queue.put(1);

        let token = CancelToken::new();
        token.cancel();

        assert_eq!(queue.take(&token), Ok(1));
        assert_eq!(queue.take(&token), Err(CancelError::Cancelled));
    }

    #[test]
    fn test_watcher_retired_after_value() {
        let queue = BlockingQueue::new(false);
        let token = CancelToken::new();

        let consumer = {
            let queue = queue.clone();
            let token = token.clone();
            thread::spawn(move || queue.take(&token))
        };

        wait_for_waiters(&queue, 1);
        assert_eq!(token.watcher_count(), 1);

        queue.put(7);
        assert_eq!(consumer.join().unwrap(), Ok(7));
        assert_eq!(token.watcher_count(), 0);
    }

    #[test]
    fn test_watcher_retired_after_deadline() {
        let queue = BlockingQueue::<i32>::new(false);
        let token = CancelToken::with_timeout(Duration::from_millis(20));

        assert_eq!(queue.take(&token), Err(CancelError::DeadlineExceeded));
        assert_eq!(token.watcher_count(), 0);
    }

    #[test]
    fn test_cancel_wakes_parked_consumer() {
        let queue = BlockingQueue::<i32>::new(false);
        let token = CancelToken::new();

        let consumer = {
            let queue = queue.clone();
            let token = token.clone();
            thread::spawn(move || queue.take(&token))
        };

        wait_for_waiters(&queue, 1);
        token.cancel();

        assert_eq!(consumer.join().unwrap(), Err(CancelError::Cancelled));
        assert_eq!(queue.stats().waiters, 0);
    }

    #[test]
    fn test_spurious_wake_is_absorbed() {
        let queue = BlockingQueue::new(false);

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.take(&CancelToken::new()))
        };

        wait_for_waiters(&queue, 1);

        // Wake without adding anything; the consumer must park again
        assert!(queue.shared.wake().is_woken());
        wait_for_waiters(&queue, 1);
        assert!(!consumer.is_finished());

        queue.put("real");
        assert_eq!(consumer.join().unwrap(), Ok("real"));
    }

    #[test]
    fn test_duplicate_put_does_not_wake_parked_consumer() {
        let queue = BlockingQueue::new(true);

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.take(&CancelToken::new()))
        };

        wait_for_waiters(&queue, 1);

        // Seed "x" behind the consumer's back, without a broadcast
        assert!(queue.shared.state.lock().push("x"));

        for _ in 0..10 {
            assert!(!queue.put("x"));
        }
        assert_eq!(queue.stats().notifications, 0);
        assert_eq!(queue.stats().waiters, 1);
        assert!(!consumer.is_finished());

        // The first genuinely new value releases it, head first
        assert!(queue.put("y"));
        assert_eq!(consumer.join().unwrap(), Ok("x"));
        assert_eq!(queue.stats().notifications, 1);
        assert_eq!(queue.snapshot(), vec!["y"]);
    }

    #[test]
    fn test_clone_shares_state() {
        let queue = BlockingQueue::new(false);
        let other = queue.clone();
        other.put(3);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_take(), Some(3));
        assert!(other.is_empty());
    }
}
