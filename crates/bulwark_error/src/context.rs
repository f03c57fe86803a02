//! Request context errors.

/// Ways a request-scoped context can end before its work completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ContextErrorKind {
    /// The context was cancelled by its owner.
    #[display("request cancelled")]
    Cancelled,
    /// The context deadline passed.
    #[display("request deadline exceeded")]
    DeadlineExceeded,
}

/// Context error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Context Error: {} at line {} in {}", kind, line, file)]
pub struct ContextError {
    kind: ContextErrorKind,
    line: u32,
    file: &'static str,
}

impl ContextError {
    /// Create a new context error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ContextErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ContextErrorKind {
        self.kind
    }
}
