//! # Synchronization Configuration
//!
//! Loaded once at startup, usually from a TOML table:
//!
//! ```toml
//! queue_capacity = 65536
//! validate_on_enqueue = true
//! ```

use serde::Deserialize;

use crate::error::{BufferError, BufferResult};

/// Configuration for a synchronized buffer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Maximum pending operations. `None` leaves the queue unbounded.
    ///
    /// An unbounded queue that is written but never flushed grows without
    /// limit.
    pub queue_capacity: Option<usize>,
    /// Reject out-of-range writes and copies when they are enqueued.
    ///
    /// When false, range faults surface from `flush` instead.
    pub validate_on_enqueue: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_capacity: None,
            validate_on_enqueue: true,
        }
    }
}

impl SyncConfig {
    /// Bounded queue holding at most `capacity` pending operations.
    #[must_use]
    pub const fn bounded(capacity: usize) -> Self {
        Self {
            queue_capacity: Some(capacity),
            validate_on_enqueue: true,
        }
    }

    /// Unbounded queue that defers range checks to flush time.
    #[must_use]
    pub const fn lazy() -> Self {
        Self {
            queue_capacity: None,
            validate_on_enqueue: false,
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidConfig`] on malformed TOML, unknown keys
    /// or invalid values.
    pub fn from_toml_str(source: &str) -> BufferResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| BufferError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidConfig`] if `queue_capacity` is zero.
    pub fn validate(&self) -> BufferResult<()> {
        if self.queue_capacity == Some(0) {
            return Err(BufferError::InvalidConfig(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
