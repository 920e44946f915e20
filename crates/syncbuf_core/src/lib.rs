//! # SYNCBUF Core
//!
//! Deferred, render-thread-synchronized writes for fixed-capacity device
//! buffers.
//!
//! Device buffers may only be mutated from the thread that owns the render
//! context. This crate lets any thread record writes and range copies, and
//! lets the render thread replay them in bulk right before a draw:
//!
//! 1. **Producers never touch the device** - writes go to a FIFO queue
//! 2. **Replay is ordered** - last write wins, copies see earlier writes
//! 3. **Flush is bounded** - only what was queued when the flush began
//!
//! ## Example
//!
//! ```rust
//! use syncbuf_core::{HostBuffer, SynchronizedBuffer};
//!
//! let buffer = SynchronizedBuffer::new(HostBuffer::<i32>::new(4));
//! buffer.set(0, 5)?;
//! buffer.set(1, 7)?;
//! buffer.copy(0, 2, 2)?;
//! buffer.set(1, 9)?;
//!
//! // Not visible before the flush
//! assert_eq!(buffer.get(1)?, 0);
//!
//! buffer.flush()?;
//! buffer.read(|host| assert_eq!(host.as_slice(), &[5, 9, 5, 7]));
//! # Ok::<(), syncbuf_core::BufferError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod device;
pub mod error;
pub mod layout;
pub mod sync;

pub use config::SyncConfig;
pub use device::{BufferHandle, DeviceBuffer, HostBuffer};
pub use error::{BufferError, BufferResult};
pub use layout::{AttributeKind, AttributeLayout, Vertex, VertexAttribute};
pub use sync::{
    BufferWriter, DeferredQueue, Flush, FlushReport, FlushStats, PendingOp, SnapshotDrain,
    SynchronizedArray, SynchronizedBuffer,
};
