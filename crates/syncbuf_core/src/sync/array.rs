//! Buffers flushed together before one draw call.

use std::sync::Arc;

use tracing::trace;

use super::buffer::SynchronizedBuffer;
use super::stats::FlushReport;
use crate::device::{BufferHandle, DeviceBuffer};
use crate::error::BufferResult;

/// Anything with queued work that must land before a draw.
pub trait Flush: Send + Sync {
    /// Replays queued operations. See [`SynchronizedBuffer::flush`].
    ///
    /// # Errors
    ///
    /// Returns the first device fault.
    fn flush(&self) -> BufferResult<FlushReport>;

    /// Operations waiting for the next flush.
    fn pending(&self) -> usize;

    /// Handle of the underlying buffer.
    fn handle(&self) -> BufferHandle;
}

impl<B> Flush for SynchronizedBuffer<B>
where
    B: DeviceBuffer + Send + Sync,
{
    #[inline]
    fn flush(&self) -> BufferResult<FlushReport> {
        SynchronizedBuffer::flush(self)
    }

    #[inline]
    fn pending(&self) -> usize {
        SynchronizedBuffer::pending(self)
    }

    #[inline]
    fn handle(&self) -> BufferHandle {
        SynchronizedBuffer::handle(self)
    }
}

/// Set of synchronized buffers bound to one draw, like a vertex array
/// object with its vertex, instance and index buffers.
///
/// ## Usage
///
/// ```rust,ignore
/// let mut vao = SynchronizedArray::new();
/// vao.attach(positions.clone());
/// vao.attach(colors.clone());
///
/// // Render thread
/// vao.draw(|| pass.draw(0..vertex_count, 0..1))?;
/// ```
#[derive(Default)]
pub struct SynchronizedArray {
    members: Vec<Arc<dyn Flush>>,
}

impl SynchronizedArray {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a buffer. Members flush in the order they were attached.
    pub fn attach(&mut self, member: Arc<dyn Flush>) {
        self.members.push(member);
    }

    /// Removes the member with `handle`. Returns true if one was removed.
    pub fn detach(&mut self, handle: BufferHandle) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.handle() != handle);
        self.members.len() != before
    }

    /// Number of attached buffers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if no buffer is attached.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Handles of the attached buffers, in flush order.
    pub fn handles(&self) -> impl Iterator<Item = BufferHandle> + '_ {
        self.members.iter().map(|m| m.handle())
    }

    /// Pending operations across all members.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.members.iter().map(|m| m.pending()).sum()
    }

    /// Flushes every member in attachment order.
    ///
    /// # Errors
    ///
    /// Stops at the first member that faults; later members are not flushed.
    pub fn flush_all(&self) -> BufferResult<FlushReport> {
        let mut total = FlushReport::default();
        for member in &self.members {
            total = total.merge(member.flush()?);
        }
        trace!(
            members = self.members.len(),
            applied = total.applied,
            "flushed buffer array"
        );
        Ok(total)
    }

    /// Flushes every member, then issues `draw`.
    ///
    /// # Errors
    ///
    /// Returns the flush fault; `draw` is not called in that case.
    pub fn draw<R>(&self, draw: impl FnOnce() -> R) -> BufferResult<R> {
        self.flush_all()?;
        Ok(draw())
    }
}

impl std::fmt::Debug for SynchronizedArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.members.iter().map(|m| m.handle()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::device::HostBuffer;
    use crate::error::BufferError;

    #[test]
    fn test_flush_all() {
        let positions = Arc::new(SynchronizedBuffer::new(HostBuffer::<[f32; 3]>::new(4)));
        let colors = Arc::new(SynchronizedBuffer::new(HostBuffer::<u32>::new(4)));

        let mut array = SynchronizedArray::new();
        array.attach(positions.clone());
        array.attach(colors.clone());
        assert_eq!(array.len(), 2);

        positions.set(0, [1.0, 2.0, 3.0]).unwrap();
        colors.set(0, 0xFF00_00FF).unwrap();
        colors.set(1, 0x00FF_00FF).unwrap();
        assert_eq!(array.pending(), 3);

        let report = array.flush_all().unwrap();
        assert_eq!(report.applied, 3);
        assert_eq!(array.pending(), 0);
        assert_eq!(positions.get(0).unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(colors.get(1).unwrap(), 0x00FF_00FF);
    }

    #[test]
    fn test_draw_runs_after_flush() {
        let vertices = Arc::new(SynchronizedBuffer::new(HostBuffer::<i32>::new(2)));
        let mut array = SynchronizedArray::new();
        array.attach(vertices.clone());

        vertices.set(1, 4).unwrap();
        let seen = array.draw(|| vertices.get(1).unwrap()).unwrap();
        assert_eq!(seen, 4);
    }

    #[test]
    fn test_fault_stops_later_members() {
        let bad = Arc::new(
            SynchronizedBuffer::with_config(HostBuffer::<i32>::new(2), SyncConfig::lazy()).unwrap(),
        );
        let good = Arc::new(SynchronizedBuffer::new(HostBuffer::<i32>::new(2)));

        let mut array = SynchronizedArray::new();
        array.attach(bad.clone());
        array.attach(good.clone());

        bad.set(5, 1).unwrap();
        good.set(0, 1).unwrap();

        let mut drawn = false;
        let result = array.draw(|| drawn = true);
        assert!(matches!(result, Err(BufferError::IndexOutOfRange { .. })));
        assert!(!drawn);
        assert_eq!(good.pending(), 1);
    }

    #[test]
    fn test_detach() {
        let a = Arc::new(SynchronizedBuffer::new(HostBuffer::<i32>::new(1)));
        let b = Arc::new(SynchronizedBuffer::new(HostBuffer::<i32>::new(1)));

        let mut array = SynchronizedArray::new();
        array.attach(a.clone());
        array.attach(b.clone());

        assert!(array.detach(a.handle()));
        assert!(!array.detach(a.handle()));
        assert_eq!(array.handles().collect::<Vec<_>>(), vec![b.handle()]);
    }
}
