//! Error types for the Bulwark moderation engine.
//!
//! Every layer reports failures as a `*ErrorKind` describing the condition,
//! wrapped in a struct that records where the error was raised. The
//! crate-level [`BulwarkError`] unifies them so `?` works across crates.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod config;
mod context;
mod error;
mod probe;

pub use action::{ActionError, ActionErrorKind};
pub use config::ConfigError;
pub use context::{ContextError, ContextErrorKind};
pub use error::{BulwarkError, BulwarkErrorKind, BulwarkResult};
pub use probe::{ProbeError, ProbeErrorKind};
