//! Crate-level error unifying every layer.

use crate::{ActionError, ConfigError, ContextError, ProbeError};

/// Crate-level error variants.
#[derive(Debug, Clone, derive_more::From, derive_more::Display)]
pub enum BulwarkErrorKind {
    /// Configuration error
    #[display("{_0}")]
    Config(ConfigError),
    /// Request context ended
    #[display("{_0}")]
    Context(ContextError),
    /// Capability probe error
    #[display("{_0}")]
    Probe(ProbeError),
    /// Collaborator call failed
    #[display("{_0}")]
    Action(ActionError),
}

/// Bulwark error with kind discrimination.
#[derive(Debug, Clone)]
pub struct BulwarkError(Box<BulwarkErrorKind>);

impl BulwarkError {
    /// Create a new error from a kind.
    pub fn new(kind: BulwarkErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BulwarkErrorKind {
        &self.0
    }
}

impl std::fmt::Display for BulwarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bulwark Error: {}", self.0)
    }
}

impl std::error::Error for BulwarkError {}

// Generic From implementation for any type that converts to BulwarkErrorKind
impl<T> From<T> for BulwarkError
where
    T: Into<BulwarkErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Bulwark operations.
pub type BulwarkResult<T> = std::result::Result<T, BulwarkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextErrorKind, ProbeErrorKind};

    #[test]
    fn test_probe_error_lifts_into_bulwark_error() {
        fn probe() -> Result<(), ProbeError> {
            Err(ProbeError::new(ProbeErrorKind::Forbidden))
        }
        fn run() -> BulwarkResult<()> {
            probe()?;
            Ok(())
        }

        let err = run().unwrap_err();
        assert!(matches!(err.kind(), BulwarkErrorKind::Probe(p) if p.is_forbidden()));
        assert!(err.to_string().contains("Request forbidden"));
    }

    #[test]
    fn test_context_error_maps_to_probe_kind() {
        let probe: ProbeError = ContextError::new(ContextErrorKind::DeadlineExceeded).into();
        assert_eq!(
            probe.kind(),
            &ProbeErrorKind::Context(ContextErrorKind::DeadlineExceeded)
        );
    }
}
