//! Request-scoped cancellation and deadlines.

use bulwark_error::{ContextError, ContextErrorKind};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellable, optionally deadline-bound context for one unit of work.
///
/// Every network call made while evaluating an event runs through
/// [`RequestContext::run`], so a slow remote server can delay a dispatch by
/// at most the configured timeout.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context cancelled together with `token`.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Sets the deadline to `timeout` from now, keeping an earlier deadline if one exists.
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self;
        };
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Derives a context that is cancelled when this one is, but can be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Runs `fut` until it completes, the context is cancelled, or the deadline passes.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ContextError>
    where
        F: Future,
    {
        if self.token.is_cancelled() {
            return Err(ContextError::new(ContextErrorKind::Cancelled));
        }
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(ContextError::new(ContextErrorKind::Cancelled)),
                result = tokio::time::timeout_at(deadline, fut) => {
                    result.map_err(|_| ContextError::new(ContextErrorKind::DeadlineExceeded))
                }
            },
            None => tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(ContextError::new(ContextErrorKind::Cancelled)),
                output = fut => Ok(output),
            },
        }
    }
}
