//! # Synchronized Buffer
//!
//! Defers every mutation of a device buffer to the render thread.
//!
//! ## Architecture
//!
//! ```text
//!   Producer 1 ──┐
//!   Producer 2 ──┼──> [DeferredQueue] ──flush()──> [DeviceBuffer]
//!   Producer N ──┘     (lock-free)    render thread   (RwLock)
//!                                                       │
//!   Any thread ────────────── get() ────────────────────┘
//! ```
//!
//! ## Read-after-write hazard
//!
//! `get` reads the physical buffer. A `set` is invisible to `get` until the
//! next `flush` has replayed it:
//!
//! ```text
//! logical contents = physical contents + replay(queue)
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use super::op::PendingOp;
use super::queue::DeferredQueue;
use super::stats::{FlushReport, FlushStats, StatsCounters};
use super::writer::BufferWriter;
use crate::config::SyncConfig;
use crate::device::{BufferHandle, DeviceBuffer};
use crate::error::BufferResult;
use crate::layout::AttributeLayout;

/// Proxy that queues writes to a device buffer and replays them on flush.
///
/// Writes and copies may be issued from any thread, through `&self` or a
/// [`BufferWriter`]. [`flush`](Self::flush) must be called from the thread
/// that owns the render context, immediately before a draw that reads the
/// buffer.
///
/// The proxy does not manage the buffer's lifetime: dropping it releases
/// nothing on the device, and [`into_inner`](Self::into_inner) hands the
/// buffer back. Wrap `&mut B` to leave ownership with the caller entirely.
///
/// ## Usage
///
/// ```rust,ignore
/// let positions = SynchronizedBuffer::new(HostBuffer::<[f32; 4]>::new(4096));
///
/// // Logic thread
/// positions.set(17, [1.0, 0.0, 2.0, 1.0])?;
///
/// // Render thread, right before the draw call
/// positions.flush()?;
/// positions.read(|buffer| upload(buffer.as_bytes()));
/// ```
pub struct SynchronizedBuffer<B: DeviceBuffer> {
    /// The wrapped buffer. Written only during flush / `apply_now`.
    buffer: RwLock<B>,
    /// Pending operations, FIFO.
    queue: DeferredQueue<B::Element>,
    /// Enqueue path shared with handed-out writers.
    writer: BufferWriter<B::Element>,
    /// Cached at construction: capacity and layout are fixed.
    capacity: usize,
    layout: AttributeLayout,
    handle: BufferHandle,
    config: SyncConfig,
    stats: Arc<StatsCounters>,
}

impl<B: DeviceBuffer> SynchronizedBuffer<B> {
    /// Wraps `buffer` with the default configuration (unbounded queue,
    /// enqueue-time validation).
    #[must_use]
    pub fn new(buffer: B) -> Self {
        Self::build(buffer, SyncConfig::default())
    }

    /// Wraps `buffer` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidConfig`](crate::BufferError::InvalidConfig)
    /// if the configuration does not validate.
    pub fn with_config(buffer: B, config: SyncConfig) -> BufferResult<Self> {
        config.validate()?;
        Ok(Self::build(buffer, config))
    }

    fn build(buffer: B, config: SyncConfig) -> Self {
        let capacity = buffer.capacity();
        let layout = buffer.layout().clone();
        let handle = buffer.handle();
        let queue = DeferredQueue::new(config.queue_capacity);
        let stats = Arc::new(StatsCounters::default());
        let writer = BufferWriter::new(
            queue.sender(),
            config.queue_capacity,
            capacity,
            config.validate_on_enqueue,
            Arc::clone(&stats),
            handle,
        );

        Self {
            buffer: RwLock::new(buffer),
            queue,
            writer,
            capacity,
            layout,
            handle,
            config,
            stats,
        }
    }

    /// Fixed element capacity of the wrapped buffer.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Per-element attribute layout of the wrapped buffer.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &AttributeLayout {
        &self.layout
    }

    /// Handle of the wrapped buffer.
    #[inline]
    #[must_use]
    pub const fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Reads the physical value at `index`, ignoring anything still queued.
    ///
    /// Blocks while a flush or `apply_now` holds the buffer; a flush holds it
    /// for its whole batch.
    ///
    /// # Errors
    ///
    /// Whatever the wrapped buffer reports for an invalid index.
    #[inline]
    pub fn get(&self, index: usize) -> BufferResult<B::Element> {
        self.buffer.read().get(index)
    }

    /// Queues a write of `value` at `index`. The buffer is not touched.
    ///
    /// # Errors
    ///
    /// See [`BufferWriter::enqueue`].
    #[inline]
    pub fn set(&self, index: usize, value: B::Element) -> BufferResult<()> {
        self.writer.set(index, value)
    }

    /// Queues a copy of `count` elements from `read_index` to `write_index`.
    ///
    /// When replayed, the copy sees every operation queued before it.
    ///
    /// # Errors
    ///
    /// See [`BufferWriter::enqueue`].
    #[inline]
    pub fn copy(&self, read_index: usize, write_index: usize, count: usize) -> BufferResult<()> {
        self.writer.copy(read_index, write_index, count)
    }

    /// Returns a producer handle feeding this buffer's queue.
    #[must_use]
    pub fn writer(&self) -> BufferWriter<B::Element> {
        self.writer.clone()
    }

    /// Number of operations waiting for the next flush.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Replays the queued operations onto the wrapped buffer, in FIFO order.
    ///
    /// Only the operations queued when the flush takes the buffer's write
    /// lock are replayed; anything enqueued meanwhile waits for the next
    /// flush. Concurrent flushes serialize on that lock. Render thread only.
    ///
    /// # Errors
    ///
    /// Returns the first fault raised by the wrapped buffer. The faulting
    /// operation is consumed; the rest of the batch is not applied in this
    /// flush and stays queued. Nothing is rolled back.
    pub fn flush(&self) -> BufferResult<FlushReport> {
        if self.queue.is_empty() {
            return Ok(self.empty_flush());
        }

        // Sample under the write lock so a flush waiting on another one
        // cannot count operations enqueued after it started.
        let mut buffer = self.buffer.write();
        let drain = self.queue.drain_snapshot();
        let snapshot = drain.remaining();
        if snapshot == 0 {
            drop(buffer);
            return Ok(self.empty_flush());
        }

        let mut applied = 0;
        for op in drain {
            if let Err(err) = op.apply(&mut *buffer) {
                drop(buffer);
                self.stats.record_flush(applied, true);
                warn!(
                    handle = self.handle.raw(),
                    applied,
                    skipped = snapshot - applied - 1,
                    error = %err,
                    "flush aborted by device fault"
                );
                return Err(err);
            }
            applied += 1;
        }
        drop(buffer);

        self.stats.record_flush(applied, false);
        let remaining = self.queue.len();
        debug!(
            handle = self.handle.raw(),
            applied, remaining, "flushed pending operations"
        );
        Ok(FlushReport { applied, remaining })
    }

    fn empty_flush(&self) -> FlushReport {
        self.stats.record_flush(0, false);
        trace!(handle = self.handle.raw(), "flush: nothing queued");
        FlushReport {
            applied: 0,
            remaining: self.queue.len(),
        }
    }

    /// Applies `op` to the wrapped buffer immediately, bypassing the queue.
    ///
    /// Takes effect before anything still queued. Render thread only.
    ///
    /// # Errors
    ///
    /// Propagates the wrapped buffer's fault.
    pub fn apply_now(&self, op: PendingOp<B::Element>) -> BufferResult<()> {
        op.apply(&mut *self.buffer.write())?;
        self.stats.record_applied(1);
        Ok(())
    }

    /// Flushes, then runs `draw` with read access to the wrapped buffer.
    ///
    /// # Errors
    ///
    /// Returns the flush fault; `draw` is not called in that case.
    ///
    /// # Deadlocks
    ///
    /// `draw` runs under the buffer's read lock, which is not reentrant for
    /// writers: calling [`flush`](Self::flush) or
    /// [`apply_now`](Self::apply_now) on the same buffer from inside `draw`
    /// deadlocks.
    pub fn draw_with<R>(&self, draw: impl FnOnce(&B) -> R) -> BufferResult<R> {
        self.flush()?;
        Ok(draw(&*self.buffer.read()))
    }

    /// Runs `f` with read access to the wrapped buffer (physical state).
    ///
    /// # Deadlocks
    ///
    /// `f` runs under the buffer's read lock: calling
    /// [`flush`](Self::flush) or [`apply_now`](Self::apply_now) on the same
    /// buffer from inside `f` deadlocks.
    pub fn read<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&*self.buffer.read())
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> FlushStats {
        self.stats.snapshot()
    }

    /// Returns the wrapped buffer. Operations still queued are discarded.
    #[must_use]
    pub fn into_inner(self) -> B {
        let pending = self.queue.len();
        if pending > 0 {
            warn!(
                handle = self.handle.raw(),
                pending, "discarding unflushed operations"
            );
        }
        self.buffer.into_inner()
    }
}

impl<B> std::fmt::Debug for SynchronizedBuffer<B>
where
    B: DeviceBuffer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynchronizedBuffer")
            .field("handle", &self.handle)
            .field("capacity", &self.capacity)
            .field("pending", &self.queue.len())
            .field("config", &self.config)
            .finish()
    }
}
