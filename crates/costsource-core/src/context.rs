//! Per-call cancellation and deadlines.

use crate::Status;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied cancellation signal and optional deadline for one call.
///
/// Every contract method receives a `CallContext`. Plugin code that waits
/// (on a backend, or on an artificial delay) should race that wait against
/// [`CallContext::done`] so a caller that gives up is not kept waiting.
///
/// Clones share the same cancellation token.
///
/// # Examples
///
/// ```
/// use costsource_core::CallContext;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = CallContext::with_timeout(Duration::from_millis(10));
/// let status = ctx.sleep(Duration::from_secs(5)).await.unwrap_err();
/// assert!(status.is_cancellation());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context with an absolute deadline.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Replaces the cancellation token, keeping the deadline.
    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Tightens the deadline to `timeout` from now if that is earlier than
    /// the current one.
    #[must_use]
    pub fn tightened(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(self.deadline.map_or(candidate, |d| d.min(candidate)));
        self
    }

    /// A context cancelled together with this one, sharing its deadline, that
    /// can also be cancelled on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and all its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The absolute deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, saturating at zero.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` once the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves when the caller gives up, yielding the matching status.
    ///
    /// Never resolves for a background context that is not cancelled.
    pub async fn done(&self) -> Status {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => Status::cancelled("call cancelled by caller"),
                    () = tokio::time::sleep_until(deadline) => {
                        Status::deadline_exceeded("caller deadline exceeded")
                    }
                }
            }
            None => {
                self.token.cancelled().await;
                Status::cancelled("call cancelled by caller")
            }
        }
    }

    /// Sleeps for `duration` unless the caller gives up first.
    ///
    /// # Errors
    ///
    /// Returns a `Cancelled` or `DeadlineExceeded` status as soon as the
    /// context is done, without waiting out the rest of `duration`.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Status> {
        tokio::select! {
            biased;
            status = self.done() => Err(status),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
