/*!
 * Queue Types
 * Statistics snapshot reported by the blocking queue
 */

use serde::{Deserialize, Serialize};

/// Queue statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Elements currently queued
    pub length: usize,
    /// Whether de-duplication is enabled
    pub dedup: bool,
    /// Consumers currently parked in `take`
    pub waiters: usize,
    /// Broadcasts issued to parked consumers since construction
    pub notifications: u64,
}
