//! Store error types.

use std::time::Duration;

/// Error raised by filesystem stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying storage failure. Always surfaced, never swallowed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O operation exceeded its deadline.
    #[error("{op} timed out after {timeout:?}")]
    Timeout {
        op: &'static str,
        timeout: Duration,
    },

    /// The exclusive document lock could not be acquired in time.
    #[error("document lock not acquired within {timeout:?}")]
    LockTimeout { timeout: Duration },
}
