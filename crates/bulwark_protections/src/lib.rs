//! Protections: configurable automated moderation rules.
//!
//! This crate holds the protection configuration model exactly as it is
//! persisted (see [`Protections`]), the bypass policy shared by the
//! per-sender protections, and the three rule implementations:
//!
//! - [`NoMediaProtection`] - redacts message types outside an allow-list
//! - [`MaxMentionsProtection`] - limits structured mentions per message or per window
//! - [`ServerRequirementsProtection`] - redacts senders whose home server
//!   does not enforce the required registration stages
//!
//! Configuration values are plain data. Mutable state (mention counters and
//! the capability cache) lives in [`ProtectionState`], which the engine owns
//! and keeps across configuration updates.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bypass;
mod capability_cache;
mod config;
mod counters;
mod max_mentions;
mod no_media;
mod protection;
mod server_requirements;
mod state;

pub use bypass::BypassPolicy;
pub use capability_cache::{CAPABILITY_TTL, CapabilityCache};
pub use config::{ProtectionScope, ProtectionSet, Protections};
pub use counters::{MentionCounter, MentionCounterStore};
pub use max_mentions::MaxMentionsProtection;
pub use no_media::NoMediaProtection;
pub use protection::{Evaluation, Protection, ProtectionKind, Verdict};
pub use server_requirements::{
    RegistrationRequirements, ServerRequirementsChecker, ServerRequirementsProtection,
};
pub use state::ProtectionState;
