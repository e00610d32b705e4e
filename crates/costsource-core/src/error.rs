//! Harness and infrastructure error types.
//!
//! These errors describe failures of the SDK machinery itself (a transport
//! that could not start, a frame that could not be decoded, an invalid
//! configuration). They are deliberately separate from [`Status`], which is
//! the classified error a plugin returns for a single call.
//!
//! # Examples
//!
//! ```
//! use costsource_core::{Error, Result};
//!
//! fn require_buffer(size: usize) -> Result<()> {
//!     if size == 0 {
//!         return Err(Error::ConfigError {
//!             message: "duplex buffer size cannot be zero".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_buffer(0).unwrap_err();
//! assert!(err.is_config_error());
//! ```
//!
//! [`Status`]: crate::Status

use thiserror::Error;

/// Main error type for harness and infrastructure failures.
#[derive(Error, Debug)]
pub enum Error {
    /// The in-process transport has not been started yet.
    #[error("transport has not been started")]
    TransportNotStarted,

    /// The in-process transport has already been stopped.
    ///
    /// Client handles obtained before the stop become unusable; asking the
    /// harness for a new one yields this error.
    #[error("transport has been stopped")]
    TransportStopped,

    /// No async runtime is available to host the transport tasks.
    #[error("async runtime unavailable: {message}")]
    RuntimeUnavailable {
        /// Description of why the runtime could not be used
        message: String,
    },

    /// Configuration error.
    ///
    /// Raised when configuration is invalid or contains contradictory
    /// settings.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Serialization/deserialization error.
    ///
    /// Raised when a wire frame or a report cannot be converted to or from
    /// JSON.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Validation error for a constructed value.
    ///
    /// Raised by builders when the assembled value violates an invariant
    /// (for example a negative cost or a malformed currency code).
    #[error("Validation error in {field}: {reason}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Detailed reason for the validation failure
        reason: String,
    },
}

impl Error {
    /// Returns `true` if the transport was used outside its start/stop window.
    ///
    /// # Examples
    ///
    /// ```
    /// use costsource_core::Error;
    ///
    /// assert!(Error::TransportStopped.is_transport_lifecycle_error());
    /// assert!(Error::TransportNotStarted.is_transport_lifecycle_error());
    /// ```
    #[must_use]
    pub const fn is_transport_lifecycle_error(&self) -> bool {
        matches!(self, Self::TransportNotStarted | Self::TransportStopped)
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is a serialization error.
    #[must_use]
    pub const fn is_serialization_error(&self) -> bool {
        matches!(self, Self::SerializationError { .. })
    }

    /// Returns `true` if this is a validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use costsource_core::Error;
    ///
    /// let err = Error::ValidationError {
    ///     field: "currency".to_string(),
    ///     reason: "must be a three-letter code".to_string(),
    /// };
    /// assert!(err.is_validation_error());
    /// ```
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::SerializationError {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;
