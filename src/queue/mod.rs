/*!
 * Queue Module
 * Ordered FIFO storage with optional de-duplication
 */

pub mod config;
pub mod dedup;
pub(crate) mod fifo;
pub mod types;

// Re-export public API
pub use config::QueueConfig;
pub use dedup::DedupQueue;
pub use types::QueueStats;
