//! Bulwark: automated protection evaluation for a federated chat moderation bot.
//!
//! Given a stream of room events, Bulwark decides per room and per configured
//! protection whether an event should be redacted. This crate re-exports the
//! public API of the workspace crates and provides [`EngineConfig`] for
//! loading engine settings from a file and the environment.
//!
//! # Crates
//!
//! - [`bulwark_core`] - identifiers, events, power levels, collaborator ports
//! - [`bulwark_probe`] - remote server capability probes
//! - [`bulwark_protections`] - protection configuration and rules
//! - [`bulwark_engine`] - snapshot handling and dispatch

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;

pub use config::{EngineConfig, LogFormat};

pub use bulwark_core::{
    ActionExecutor, Clock, EventId, EventKind, ManagementNotifier, Mentions, MockClock,
    NormalizedEvent, PowerLevelSource, PowerLevels, RawEvent, RequestContext, RoomId, ServerName,
    StaticPowerLevels, SystemClock, UserId,
};
pub use bulwark_engine::{
    Action, DispatchReport, EngineSettings, LoggingExecutor, ProtectionEngine, StateSweeper,
    UpdateOutcome,
};
pub use bulwark_error::{
    ActionError, ActionErrorKind, BulwarkError, BulwarkErrorKind, BulwarkResult, ConfigError,
    ContextError, ContextErrorKind, ProbeError, ProbeErrorKind,
};
pub use bulwark_probe::{HttpProbeClient, RegistrationProbe, ServerDiscovery};
pub use bulwark_protections::{
    BypassPolicy, MaxMentionsProtection, NoMediaProtection, ProtectionKind, ProtectionSet,
    ProtectionState, Protections, ServerRequirementsProtection,
};
