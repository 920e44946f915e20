//! Flush accounting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of one successful flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Operations applied to the device buffer.
    pub applied: usize,
    /// Operations left queued (enqueued after the snapshot).
    pub remaining: usize,
}

impl FlushReport {
    /// Sums two reports, for flushing several buffers as one.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            applied: self.applied + other.applied,
            remaining: self.remaining + other.remaining,
        }
    }
}

/// Statistics snapshot for a synchronized buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Flushes started.
    pub total_flushes: u64,
    /// Flushes aborted by a device fault.
    pub failed_flushes: u64,
    /// Operations applied, through flush or `apply_now`.
    pub total_applied: u64,
    /// Operations accepted into the queue.
    pub total_enqueued: u64,
    /// Operations refused at enqueue (range check or full queue).
    pub total_rejected: u64,
    /// Operations applied by the most recent flush.
    pub last_batch_size: u64,
}

/// Shared counters behind [`FlushStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    flushes: AtomicU64,
    failed_flushes: AtomicU64,
    applied: AtomicU64,
    enqueued: AtomicU64,
    rejected: AtomicU64,
    last_batch: AtomicU64,
}

impl StatsCounters {
    #[inline]
    pub(crate) fn record_enqueue(&self, accepted: bool) {
        if accepted {
            self.enqueued.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_applied(&self, count: usize) {
        self.applied.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self, applied: usize, failed: bool) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_flushes.fetch_add(1, Ordering::Relaxed);
        }
        self.record_applied(applied);
        self.last_batch.store(applied as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> FlushStats {
        FlushStats {
            total_flushes: self.flushes.load(Ordering::Relaxed),
            failed_flushes: self.failed_flushes.load(Ordering::Relaxed),
            total_applied: self.applied.load(Ordering::Relaxed),
            total_enqueued: self.enqueued.load(Ordering::Relaxed),
            total_rejected: self.rejected.load(Ordering::Relaxed),
            last_batch_size: self.last_batch.load(Ordering::Relaxed),
        }
    }
}
