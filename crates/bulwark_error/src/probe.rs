//! Capability probe error types.

use crate::{ContextError, ContextErrorKind};

/// Error kinds for remote server capability probes.
///
/// `Unrecognized` and `Forbidden` are classified responses rather than
/// failures: the requirements checker turns them into verdicts. Everything
/// else leaves the verdict uncached so the next check probes again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProbeErrorKind {
    /// Server discovery failed.
    #[display("Server discovery failed: {_0}")]
    Discovery(String),
    /// The request never produced an HTTP response.
    #[display("Transport error: {_0}")]
    Transport(String),
    /// The server does not know the requested endpoint.
    #[display("Endpoint not recognized")]
    Unrecognized,
    /// The server refused the request.
    #[display("Request forbidden")]
    Forbidden,
    /// Any other non-success HTTP response.
    #[display("HTTP {status} {errcode:?}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Matrix error code, if the body carried one
        errcode: Option<String>,
        /// Error message from the body
        message: String,
    },
    /// The response body could not be interpreted.
    #[display("Invalid response: {_0}")]
    InvalidResponse(String),
    /// The discovered or fallback base URL is not a valid URL.
    #[display("Invalid base URL: {_0}")]
    InvalidBaseUrl(String),
    /// The request context ended before the probe completed.
    #[display("{_0}")]
    Context(ContextErrorKind),
}

/// Capability probe error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Probe Error: {} at line {} in {}", kind, line, file)]
pub struct ProbeError {
    kind: ProbeErrorKind,
    line: u32,
    file: &'static str,
}

impl ProbeError {
    /// Create a new probe error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProbeErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ProbeErrorKind {
        &self.kind
    }

    /// Whether the server answered that it does not know the endpoint.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self.kind, ProbeErrorKind::Unrecognized)
    }

    /// Whether the server refused the request.
    pub fn is_forbidden(&self) -> bool {
        matches!(self.kind, ProbeErrorKind::Forbidden)
    }
}

impl From<ContextError> for ProbeError {
    #[track_caller]
    fn from(err: ContextError) -> Self {
        Self::new(ProbeErrorKind::Context(err.kind()))
    }
}
