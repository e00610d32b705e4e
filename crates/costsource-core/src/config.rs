//! Configuration types for the in-process harness.
//!
//! # Examples
//!
//! ```
//! use costsource_core::HarnessConfig;
//! use std::time::Duration;
//!
//! // Use default configuration
//! let config = HarnessConfig::default();
//! assert_eq!(config.shutdown_grace, Duration::from_secs(5));
//!
//! // Create custom configuration
//! let custom = HarnessConfig {
//!     shutdown_grace: Duration::from_millis(200),
//!     ..Default::default()
//! };
//! assert!(custom.validate().is_ok());
//! ```

use crate::{Error, Result};
use std::time::Duration;

/// Smallest frame limit the transport accepts.
const MIN_FRAME_LENGTH: usize = 1024;

/// Configuration for the in-process transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Capacity in bytes of each direction of the in-memory duplex pipe.
    ///
    /// Default: 64 KiB
    pub duplex_buffer_size: usize,

    /// Largest encoded frame either side will accept.
    ///
    /// Default: 16 MiB
    pub max_frame_length: usize,

    /// How long `stop()` waits for in-flight calls before cancelling them.
    ///
    /// Default: 5 seconds
    pub shutdown_grace: Duration,

    /// Deadline applied to calls whose context carries none.
    ///
    /// `None` leaves such calls unbounded.
    /// Default: 30 seconds
    pub default_call_timeout: Option<Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            duplex_buffer_size: 64 * 1024,
            max_frame_length: 16 * 1024 * 1024,
            shutdown_grace: Duration::from_secs(5),
            default_call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl HarnessConfig {
    /// Sets the shutdown grace period.
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Sets the default per-call timeout.
    #[must_use]
    pub const fn with_default_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_call_timeout = timeout;
        self
    }

    /// Checks that buffer and frame sizes are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for a zero buffer, a frame limit under
    /// 1 KiB, or a zero default timeout.
    pub fn validate(&self) -> Result<()> {
        if self.duplex_buffer_size == 0 {
            return Err(Error::ConfigError {
                message: "duplex_buffer_size must be greater than zero".to_string(),
            });
        }
        if self.max_frame_length < MIN_FRAME_LENGTH {
            return Err(Error::ConfigError {
                message: format!(
                    "max_frame_length must be at least {MIN_FRAME_LENGTH} bytes, got {}",
                    self.max_frame_length
                ),
            });
        }
        if self.default_call_timeout == Some(Duration::ZERO) {
            return Err(Error::ConfigError {
                message: "default_call_timeout must be non-zero when set".to_string(),
            });
        }
        Ok(())
    }
}
