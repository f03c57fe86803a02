//! Protection dispatch engine.
//!
//! [`ProtectionEngine`] holds the current protections snapshot, routes each
//! incoming event to the protections that apply to its room, and performs at
//! most one redaction per event. Configuration updates swap the snapshot
//! atomically; counters and cached verdicts live in
//! [`bulwark_protections::ProtectionState`] and survive updates.
//!
//! # Example
//!
//! ```no_run
//! use bulwark_core::{StaticPowerLevels, SystemClock};
//! use bulwark_engine::{EngineSettings, LoggingExecutor, ProtectionEngine};
//! use bulwark_probe::HttpProbeClient;
//! use bulwark_protections::ProtectionState;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let probe = Arc::new(HttpProbeClient::new("bulwark")?);
//! let state = ProtectionState::new(Arc::new(SystemClock::new()), probe.clone(), probe);
//! let settings = EngineSettings::builder()
//!     .bot_user_id("@bulwark:example.org")
//!     .build()?;
//! let engine = ProtectionEngine::new(
//!     settings,
//!     state,
//!     Arc::new(StaticPowerLevels::default()),
//!     Arc::new(LoggingExecutor),
//! );
//! let outcome = engine.update_protections(br#"{"global": {"no_media": {"enabled": true}}}"#);
//! assert!(outcome.is_ok());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod diff;
mod engine;
mod executor;
mod report;
mod settings;
mod sweeper;

pub use diff::diff_protections;
pub use engine::ProtectionEngine;
pub use executor::LoggingExecutor;
pub use report::{Action, DispatchReport, UpdateOutcome};
pub use settings::{DEFAULT_REQUEST_TIMEOUT, EngineSettings, EngineSettingsBuilder};
pub use sweeper::StateSweeper;
