//! # Pool Errors
//!
//! Every failure the pool can report to a caller. Double release of an already
//! free slot is deliberately absent: it is absorbed as a no-op.

use thiserror::Error;

/// Result alias used across the crate.
pub type PoolResult<T> = Result<T, PoolError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool has not been initialized, or has been destroyed.
    #[error("pool is not initialized")]
    PoolNotReady,

    /// Every slot is occupied.
    #[error("pool exhausted: all {capacity} slots are in use")]
    PoolExhausted { capacity: u32 },

    /// A raw handle names a slot outside the buffer.
    #[error("slot index {index} is out of range for capacity {capacity}")]
    OutOfRangeHandle { index: u32, capacity: u32 },

    /// The handle was issued by another pool or by an earlier lifecycle of this one.
    #[error("handle does not belong to the current pool lifecycle")]
    StaleHandle,

    #[error("invalid pool capacity {capacity}")]
    InvalidCapacity { capacity: u32 },

    #[error("failed to parse pool config: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = PoolError::OutOfRangeHandle {
            index: 9,
            capacity: 3,
        };
        assert_eq!(
            err.to_string(),
            "slot index 9 is out of range for capacity 3"
        );
        assert_eq!(
            PoolError::PoolExhausted { capacity: 1 }.to_string(),
            "pool exhausted: all 1 slots are in use"
        );
    }
}
