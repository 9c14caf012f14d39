/*!
 * Error Types
 * Cancellation taxonomy for blocking queue operations
 *
 * Emptiness and duplicate rejection are ordinary results (`Option`, `bool`,
 * counts), never errors. The only error a queue operation can surface is a
 * cancellation, which comes in two flavours: an explicit abort by the caller
 * and a deadline that elapsed on its own.
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;

/// Result type for blocking take operations
pub type TakeResult<T> = Result<T, CancelError>;

/// Reason a cancellation token fired
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Diagnostic)]
#[serde(tag = "error_type", rename_all = "snake_case")]
pub enum CancelError {
    #[error("operation cancelled")]
    #[diagnostic(
        code(queue::cancelled),
        help("The cancellation token was cancelled explicitly, either directly or through a parent token.")
    )]
    Cancelled,

    #[error("deadline exceeded")]
    #[diagnostic(
        code(queue::deadline_exceeded),
        help("No element arrived before the token's deadline. Retry with a longer timeout if appropriate.")
    )]
    DeadlineExceeded,
}

impl CancelError {
    /// True for an explicit cancellation
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CancelError::Cancelled)
    }

    /// True when the deadline elapsed
    #[inline]
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, CancelError::DeadlineExceeded)
    }
}

/// Reports whether `err`, or any error in its `source()` chain, is a
/// [`CancelError`] of either kind.
///
/// Callers that only care "was this a cancellation" can use this instead of
/// matching on the variant, and it keeps working after the error has been
/// wrapped by higher layers.
pub fn is_cancellation(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<CancelError>() {
            return true;
        }
        current = e.source();
    }
    false
}
