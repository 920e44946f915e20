//! FIFO queue of pending operations.
//!
//! Backed by a crossbeam channel: appends are lock-free for any number of
//! producers, and the single consumer may drain while producers keep
//! appending.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use super::op::PendingOp;
use crate::error::{BufferError, BufferResult};

/// Ordered, concurrent-safe sequence of [`PendingOp`]s.
pub struct DeferredQueue<T> {
    sender: Sender<PendingOp<T>>,
    receiver: Receiver<PendingOp<T>>,
    capacity: Option<usize>,
}

impl<T> DeferredQueue<T> {
    /// Creates a queue. `None` means unbounded.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `Some(0)`.
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(cap) => {
                assert!(cap > 0, "Queue capacity must be greater than zero");
                bounded(cap)
            }
            None => unbounded(),
        };
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Appends an operation at the tail.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::QueueFull`] when a bounded queue is full.
    #[inline]
    pub fn push(&self, op: PendingOp<T>) -> BufferResult<()> {
        send_op(&self.sender, self.capacity, op)
    }

    /// Removes the head operation, if any.
    #[inline]
    pub fn pop(&self) -> Option<PendingOp<T>> {
        self.receiver.try_recv().ok()
    }

    /// Number of queued operations.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Configured bound, `None` if unbounded.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Drains the operations queued right now, in FIFO order.
    ///
    /// The length is sampled once; operations appended while the drain is
    /// running stay queued.
    #[must_use]
    pub fn drain_snapshot(&self) -> SnapshotDrain<'_, T> {
        SnapshotDrain {
            queue: self,
            remaining: self.len(),
        }
    }

    pub(crate) fn sender(&self) -> Sender<PendingOp<T>> {
        self.sender.clone()
    }
}

pub(crate) fn send_op<T>(
    sender: &Sender<PendingOp<T>>,
    capacity: Option<usize>,
    op: PendingOp<T>,
) -> BufferResult<()> {
    match sender.try_send(op) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => Err(BufferError::QueueFull {
            capacity: capacity.unwrap_or(0),
        }),
        Err(TrySendError::Disconnected(_)) => Err(BufferError::Disconnected),
    }
}

/// Iterator over a length snapshot of a [`DeferredQueue`].
pub struct SnapshotDrain<'a, T> {
    queue: &'a DeferredQueue<T>,
    remaining: usize,
}

impl<T> SnapshotDrain<'_, T> {
    /// Operations still to be yielded from the snapshot.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<T> Iterator for SnapshotDrain<'_, T> {
    type Item = PendingOp<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.queue.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(index: usize, value: i32) -> PendingOp<i32> {
        PendingOp::Write { index, value }
    }

    #[test]
    fn test_fifo_order() {
        let queue = DeferredQueue::new(None);
        queue.push(write(0, 1)).unwrap();
        queue.push(write(1, 2)).unwrap();
        queue.push(write(2, 3)).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(write(0, 1)));
        assert_eq!(queue.pop(), Some(write(1, 2)));
        assert_eq!(queue.pop(), Some(write(2, 3)));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_bounded_queue_rejects_when_full() {
        let queue = DeferredQueue::new(Some(2));
        queue.push(write(0, 1)).unwrap();
        queue.push(write(0, 2)).unwrap();
        assert_eq!(
            queue.push(write(0, 3)),
            Err(BufferError::QueueFull { capacity: 2 })
        );

        let _ = queue.pop();
        assert!(queue.push(write(0, 3)).is_ok());
    }

    #[test]
    fn test_snapshot_excludes_later_pushes() {
        let queue = DeferredQueue::new(None);
        queue.push(write(0, 1)).unwrap();
        queue.push(write(1, 2)).unwrap();

        let mut drain = queue.drain_snapshot();
        assert_eq!(drain.next(), Some(write(0, 1)));
        queue.push(write(2, 3)).unwrap();
        assert_eq!(drain.next(), Some(write(1, 2)));
        assert_eq!(drain.remaining(), 0);
        assert_eq!(drain.next(), None);

        assert_eq!(queue.len(), 1);
    }

    #[test]
    #[should_panic(expected = "Queue capacity must be greater than zero")]
    fn test_zero_capacity_panics() {
        let _queue: DeferredQueue<i32> = DeferredQueue::new(Some(0));
    }
}
