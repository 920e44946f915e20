//! Enqueue-only producer handle.

use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::warn;

use super::op::PendingOp;
use super::queue::send_op;
use super::stats::StatsCounters;
use crate::device::BufferHandle;
use crate::error::{BufferError, BufferResult};
use crate::layout::Vertex;

/// Handle for queueing writes from any thread.
///
/// Obtained from [`SynchronizedBuffer::writer`](super::SynchronizedBuffer::writer).
/// Cloning is cheap; every clone feeds the same queue. A writer never sees
/// the device buffer, so it can be moved to threads that must not touch the
/// render context.
///
/// ## Usage
///
/// ```rust,ignore
/// let writer = positions.writer();
/// std::thread::spawn(move || {
///     for (i, p) in simulated.iter().enumerate() {
///         writer.set(i, *p)?;
///     }
///     Ok::<_, BufferError>(())
/// });
/// ```
#[derive(Clone)]
pub struct BufferWriter<T> {
    sender: Sender<PendingOp<T>>,
    queue_capacity: Option<usize>,
    capacity: usize,
    validate: bool,
    stats: Arc<StatsCounters>,
    handle: BufferHandle,
}

impl<T: Vertex> BufferWriter<T> {
    pub(crate) fn new(
        sender: Sender<PendingOp<T>>,
        queue_capacity: Option<usize>,
        capacity: usize,
        validate: bool,
        stats: Arc<StatsCounters>,
        handle: BufferHandle,
    ) -> Self {
        Self {
            sender,
            queue_capacity,
            capacity,
            validate,
            stats,
            handle,
        }
    }

    /// Queues a write of `value` at `index`.
    ///
    /// # Errors
    ///
    /// See [`BufferWriter::enqueue`].
    #[inline]
    pub fn set(&self, index: usize, value: T) -> BufferResult<()> {
        self.enqueue(PendingOp::Write { index, value })
    }

    /// Queues a copy of `count` elements from `read_index` to `write_index`.
    ///
    /// # Errors
    ///
    /// See [`BufferWriter::enqueue`].
    #[inline]
    pub fn copy(&self, read_index: usize, write_index: usize, count: usize) -> BufferResult<()> {
        self.enqueue(PendingOp::Copy {
            read_index,
            write_index,
            count,
        })
    }

    /// Appends `op` to the tail of the queue.
    ///
    /// # Errors
    ///
    /// - [`BufferError::IndexOutOfRange`] / [`BufferError::CopyOutOfRange`]
    ///   when enqueue-time validation is enabled
    /// - [`BufferError::QueueFull`] when a bounded queue is full
    /// - [`BufferError::Disconnected`] when the buffer has been dropped
    pub fn enqueue(&self, op: PendingOp<T>) -> BufferResult<()> {
        if self.validate {
            if let Err(err) = op.validate(self.capacity) {
                self.stats.record_enqueue(false);
                return Err(err);
            }
        }

        let result = send_op(&self.sender, self.queue_capacity, op);
        self.stats.record_enqueue(result.is_ok());
        if let Err(BufferError::QueueFull { capacity }) = result {
            warn!(
                handle = self.handle.raw(),
                capacity, "pending queue full, write rejected"
            );
        }
        result
    }

    /// Handle of the target buffer.
    #[inline]
    #[must_use]
    pub const fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Element capacity of the target buffer.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
