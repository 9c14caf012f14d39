/*!
 * Core Module
 * Error taxonomy and synchronization primitives shared by the queues
 */

pub mod errors;
pub mod sync;

// Re-export for convenience
pub use errors::*;
