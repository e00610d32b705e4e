//! Classified protocol errors returned by plugin calls.
//!
//! A [`Status`] is what a plugin returns instead of a response when a call
//! genuinely fails: bad input, a missing resource, an unavailable backend,
//! an internal fault or caller cancellation. "I have no data for this
//! resource" is never a `Status`; that is expressed with an empty result and
//! a [`FallbackHint`](crate::FallbackHint).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failed plugin call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// The request was malformed or failed validation.
    InvalidArgument,
    /// The referenced resource does not exist.
    NotFound,
    /// The plugin or its backend is temporarily unavailable.
    Unavailable,
    /// An unexpected fault inside the plugin.
    Internal,
    /// The caller cancelled the call.
    Cancelled,
    /// The caller's deadline elapsed before an answer was produced.
    DeadlineExceeded,
    /// The method is not known to the server.
    Unimplemented,
    /// The answer exceeds what the transport can carry.
    ResourceExhausted,
}

impl StatusCode {
    /// Returns the canonical snake-case name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Unimplemented => "unimplemented",
            Self::ResourceExhausted => "resource_exhausted",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified error produced by a plugin call.
///
/// # Examples
///
/// ```
/// use costsource_core::{Status, StatusCode};
///
/// let status = Status::invalid_argument("resource_id is required");
/// assert_eq!(status.code(), StatusCode::InvalidArgument);
/// assert_eq!(status.to_string(), "invalid_argument: resource_id is required");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    /// Creates a status with the given code and message.
    #[must_use]
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for [`StatusCode::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    /// Shorthand for [`StatusCode::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    /// Shorthand for [`StatusCode::Unavailable`].
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    /// Shorthand for [`StatusCode::Internal`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    /// Shorthand for [`StatusCode::Cancelled`].
    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Cancelled, message)
    }

    /// Shorthand for [`StatusCode::DeadlineExceeded`].
    #[must_use]
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(StatusCode::DeadlineExceeded, message)
    }

    /// Shorthand for [`StatusCode::Unimplemented`].
    #[must_use]
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unimplemented, message)
    }

    /// Shorthand for [`StatusCode::ResourceExhausted`].
    #[must_use]
    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ResourceExhausted, message)
    }

    /// Returns the classification of this status.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` when the call ended because the caller gave up,
    /// either by explicit cancellation or by its deadline elapsing.
    ///
    /// # Examples
    ///
    /// ```
    /// use costsource_core::Status;
    ///
    /// assert!(Status::cancelled("stop").is_cancellation());
    /// assert!(Status::deadline_exceeded("late").is_cancellation());
    /// assert!(!Status::internal("boom").is_cancellation());
    /// ```
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(
            self.code,
            StatusCode::Cancelled | StatusCode::DeadlineExceeded
        )
    }
}
