/*!
 * Deduplicating Queues
 *
 * Thread-safe FIFO queues with optional value de-duplication, in two layers:
 * - [`DedupQueue`]: non-blocking queue, internally synchronized
 * - [`BlockingQueue`]: adds consumers that wait for items, released early by
 *   a [`CancelToken`] (explicit cancel or deadline)
 *
 * With de-duplication enabled, a value already present in the queue is not
 * added again; once it leaves the queue it may be re-added. Ordering is
 * strict arrival order of accepted values.
 *
 * # Example
 *
 * ```
 * use dedup_queue::{is_cancellation, BlockingQueue};
 * use std::time::Duration;
 *
 * let queue = BlockingQueue::new(true);
 * assert_eq!(queue.put_many([1, 2, 1, 3]), 3);
 *
 * assert_eq!(queue.take_timeout(Duration::from_millis(10)), Ok(1));
 * assert_eq!(queue.snapshot(), vec![2, 3]);
 *
 * queue.clear();
 * let err = queue.take_timeout(Duration::from_millis(10)).unwrap_err();
 * assert!(err.is_deadline_exceeded());
 * assert!(is_cancellation(&err));
 * ```
 */

pub mod blocking;
pub mod core;
pub mod monitoring;
pub mod queue;

// Re-exports
pub use blocking::BlockingQueue;
pub use crate::core::errors::{is_cancellation, CancelError, TakeResult};
pub use crate::core::sync::CancelToken;
pub use monitoring::init_tracing;
pub use queue::{DedupQueue, QueueConfig, QueueStats};
