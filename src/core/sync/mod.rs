/*!
 * Synchronization Primitives
 *
 * Building blocks for the blocking queue's wait/notify protocol:
 * - Condvar with waiter accounting, tied to the caller's mutex
 * - Cancellation tokens (explicit cancel, deadline, parent/child)
 * - The `Wake` seam a token uses to reach a parked waiter
 */

mod cancel;
mod condvar;
mod traits;

pub use cancel::CancelToken;
pub use condvar::CondvarWait;
pub use traits::{Wake, WakeResult};
