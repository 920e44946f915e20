//! Recorded buffer mutations.

use crate::device::{check_copy_range, DeviceBuffer};
use crate::error::{BufferError, BufferResult};
use crate::layout::Vertex;

/// A deferred mutation of a device buffer.
///
/// Operations carry no identity. Each one is created by a write or copy
/// call, queued, and consumed exactly once by a flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingOp<T> {
    /// Store `value` at `index`.
    Write {
        /// Target element.
        index: usize,
        /// Value to store.
        value: T,
    },
    /// Copy `count` elements from `read_index` to `write_index`.
    Copy {
        /// First element read.
        read_index: usize,
        /// First element written.
        write_index: usize,
        /// Number of elements.
        count: usize,
    },
}

impl<T: Vertex> PendingOp<T> {
    /// Checks the operation against a buffer of `capacity` elements.
    ///
    /// # Errors
    ///
    /// Returns the range error the buffer would raise when applying it.
    pub fn validate(&self, capacity: usize) -> BufferResult<()> {
        match *self {
            Self::Write { index, .. } if index >= capacity => {
                Err(BufferError::IndexOutOfRange { index, capacity })
            }
            Self::Write { .. } => Ok(()),
            Self::Copy {
                read_index,
                write_index,
                count,
            } => check_copy_range(read_index, write_index, count, capacity),
        }
    }

    /// Applies the operation to `buffer`.
    ///
    /// # Errors
    ///
    /// Propagates whatever fault the buffer raises.
    #[inline]
    pub fn apply<B>(self, buffer: &mut B) -> BufferResult<()>
    where
        B: DeviceBuffer<Element = T> + ?Sized,
    {
        match self {
            Self::Write { index, value } => buffer.set(index, value),
            Self::Copy {
                read_index,
                write_index,
                count,
            } => buffer.copy(read_index, write_index, count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostBuffer;

    #[test]
    fn test_validate_write() {
        let op = PendingOp::Write { index: 3, value: 1_i32 };
        assert!(op.validate(4).is_ok());
        assert_eq!(
            op.validate(3),
            Err(BufferError::IndexOutOfRange {
                index: 3,
                capacity: 3
            })
        );
    }

    #[test]
    fn test_validate_copy() {
        let op: PendingOp<i32> = PendingOp::Copy {
            read_index: 0,
            write_index: 2,
            count: 2,
        };
        assert!(op.validate(4).is_ok());
        assert!(matches!(
            op.validate(3),
            Err(BufferError::CopyOutOfRange { .. })
        ));
    }

    #[test]
    fn test_apply() {
        let mut buffer: HostBuffer<i32> = HostBuffer::new(4);
        PendingOp::Write { index: 0, value: 5 }.apply(&mut buffer).unwrap();
        PendingOp::Copy {
            read_index: 0,
            write_index: 3,
            count: 1,
        }
        .apply(&mut buffer)
        .unwrap();
        assert_eq!(buffer.as_slice(), &[5, 0, 0, 5]);
    }
}
