//! Probe ports.

use crate::UserInteractiveFlows;
use async_trait::async_trait;
use bulwark_core::ServerName;
use bulwark_error::ProbeError;

/// Resolves a server name to its client API base URL.
#[async_trait]
pub trait ServerDiscovery: Send + Sync {
    /// Returns the advertised base URL, or `None` when the server advertises nothing usable.
    async fn discover(&self, server: &ServerName) -> Result<Option<String>, ProbeError>;
}

/// Unauthenticated requests against a server's client API.
///
/// Implementations report "endpoint not recognized" and "forbidden" answers
/// as [`bulwark_error::ProbeErrorKind::Unrecognized`] and
/// [`bulwark_error::ProbeErrorKind::Forbidden`], separate from transport
/// failures.
#[async_trait]
pub trait RegistrationProbe: Send + Sync {
    /// Requests the external authentication metadata.
    async fn auth_metadata(&self, base_url: &str) -> Result<(), ProbeError>;

    /// Starts an empty registration.
    ///
    /// Returns the offered interactive authentication flows, or `None` when
    /// the server answered without requesting interactive authentication.
    async fn register(&self, base_url: &str) -> Result<Option<UserInteractiveFlows>, ProbeError>;
}
