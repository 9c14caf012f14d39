/*!
 * Blocking Module
 * Wait/notify layer over the FIFO storage
 */

pub mod queue;

// Re-export public API
pub use queue::BlockingQueue;
