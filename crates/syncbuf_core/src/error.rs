//! # Buffer Error Types
//!
//! All errors that can occur while reading, queueing or replaying buffer
//! operations.

use thiserror::Error;

/// Errors that can occur in the synchronized buffer system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Element index outside the buffer.
    #[error("index {index} out of range for buffer of capacity {capacity}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// Range copy reaching outside the buffer.
    #[error(
        "copy of {count} elements from {read_index} to {write_index} out of range for capacity {capacity}"
    )]
    CopyOutOfRange {
        /// First element read.
        read_index: usize,
        /// First element written.
        write_index: usize,
        /// Number of elements.
        count: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// Bounded queue is full; the operation was not enqueued.
    #[error("pending queue full: capacity {capacity}")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The buffer behind a writer handle has been dropped.
    #[error("synchronized buffer dropped, writer disconnected")]
    Disconnected,

    /// Attribute layout does not describe the element type.
    #[error("invalid attribute layout: {0}")]
    InvalidLayout(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BufferError::IndexOutOfRange {
            index: 9,
            capacity: 4,
        };
        assert_eq!(
            err.to_string(),
            "index 9 out of range for buffer of capacity 4"
        );

        let err = BufferError::QueueFull { capacity: 16 };
        assert_eq!(err.to_string(), "pending queue full: capacity 16");
    }
}
