/*!
 * Deduplicating Queue
 * Non-blocking, concurrency-safe FIFO with optional de-duplication
 *
 * When de-duplication is enabled, `enqueue` ignores values already present.
 * Once a value leaves the queue (via `dequeue` or `remove`) it may be
 * enqueued again. Every method takes the internal lock for its whole
 * duration, so check-and-insert is linearizable: of two threads racing to
 * add the same absent value, exactly one sees `true`.
 */

use super::config::QueueConfig;
use super::fifo::FifoState;
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;
use tracing::trace;

/// Concurrency-safe FIFO queue with optional de-duplication
///
/// # Examples
///
/// ```
/// use dedup_queue::DedupQueue;
///
/// let queue = DedupQueue::new(true);
/// assert_eq!(queue.enqueue_many(["a", "b", "a", "c", "b"]), 3);
/// assert_eq!(queue.snapshot(), vec!["a", "b", "c"]);
///
/// assert_eq!(queue.dequeue(), Some("a"));
/// assert!(queue.enqueue("a")); // re-admitted after leaving
/// ```
pub struct DedupQueue<T> {
    state: Mutex<FifoState<T>>,
}

impl<T> DedupQueue<T>
where
    T: Eq + Hash + Clone,
{
    /// Create an empty queue
    pub fn new(dedup: bool) -> Self {
        Self::from_config(QueueConfig::new(dedup))
    }

    /// Create an empty queue with preallocated storage
    pub fn with_capacity(dedup: bool, capacity: usize) -> Self {
        Self::from_config(QueueConfig::new(dedup).with_capacity(capacity))
    }

    pub fn from_config(config: QueueConfig) -> Self {
        Self {
            state: Mutex::new(FifoState::new(config)),
        }
    }

    /// Whether de-duplication is enabled
    pub fn is_dedup(&self) -> bool {
        self.state.lock().is_dedup()
    }

    /// Append `value` to the tail
    ///
    /// Returns `false` when de-duplication is enabled and `value` is already
    /// queued. Amortized O(1).
    pub fn enqueue(&self, value: T) -> bool {
        let added = self.state.lock().push(value);
        if !added {
            trace!("duplicate value rejected");
        }
        added
    }

    /// Enqueue `values` in order and return how many were added
    ///
    /// Skipped duplicates do not disturb the order of accepted values.
    pub fn enqueue_many<I>(&self, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        self.state.lock().push_many(values)
    }

    /// Remove and return the head, or `None` when empty. O(1).
    pub fn dequeue(&self) -> Option<T> {
        self.state.lock().pop()
    }

    /// Clone of the head without removing it. O(1).
    pub fn peek(&self) -> Option<T> {
        self.state.lock().peek().cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    /// O(1) with de-duplication enabled, O(n) otherwise
    pub fn contains(&self, value: &T) -> bool {
        self.state.lock().contains(value)
    }

    /// Remove the first occurrence of `value`. O(n).
    pub fn remove(&self, value: &T) -> bool {
        self.state.lock().remove(value)
    }

    pub fn clear(&self) {
        self.state.lock().clear();
    }

    /// Copy of the contents in FIFO order, independent of the queue
    pub fn snapshot(&self) -> Vec<T> {
        self.state.lock().snapshot()
    }
}

impl<T> fmt::Debug for DedupQueue<T>
where
    T: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DedupQueue")
            .field("len", &state.len())
            .field("dedup", &state.is_dedup())
            .finish()
    }
}
