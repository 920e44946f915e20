//! # Deferred Buffer Synchronization
//!
//! ## The Problem
//!
//! ```text
//! Logic threads:  WRITE vertex data
//! Render thread:  owns the graphics context, the only thread allowed to
//!                 mutate device buffers
//!
//! Writing from logic threads directly: undefined behaviour on the device
//! ```
//!
//! ## The Solution: Deferred Replay
//!
//! ```text
//! Any thread:     set()/copy()  → append to a lock-free FIFO queue
//! Render thread:  flush()       → replay the queue onto the device buffer
//!                 draw()
//! ```
//!
//! Replay is strictly FIFO, so the last write to an index wins and a copy
//! sees every operation queued before it.

mod array;
mod buffer;
mod op;
mod queue;
mod stats;
mod writer;

pub use array::{Flush, SynchronizedArray};
pub use buffer::SynchronizedBuffer;
pub use op::PendingOp;
pub use queue::{DeferredQueue, SnapshotDrain};
pub use stats::{FlushReport, FlushStats};
pub use writer::BufferWriter;
