//! Remote server capability probing.
//!
//! Capability probes answer one question about a remote home server: does it
//! enforce the registration requirements a room cares about? The engine only
//! sees the [`ServerDiscovery`] and [`RegistrationProbe`] ports;
//! [`HttpProbeClient`] implements both over HTTPS.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod flows;
mod http;
mod ports;

pub use flows::{AuthFlow, UserInteractiveFlows, stages};
pub use http::{HttpProbeClient, fallback_base_url};
pub use ports::{RegistrationProbe, ServerDiscovery};
