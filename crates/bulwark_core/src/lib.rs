//! Core data types for the Bulwark moderation engine.
//!
//! This crate provides the identifiers, the normalized event model and the
//! ports through which the engine talks to the outside world:
//!
//! - [`PowerLevelSource`] - read access to a room's power levels
//! - [`ActionExecutor`] - performs redactions
//! - [`ManagementNotifier`] - posts notices to the management room
//!
//! Time is read through the [`Clock`] port so window and TTL behaviour can be
//! driven by [`MockClock`] in tests.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod clock;
mod context;
mod event;
mod ids;
pub mod msgtype;
mod ports;
mod power_levels;

pub use clock::{Clock, MockClock, SystemClock};
pub use context::RequestContext;
pub use event::{EventKind, Mentions, NormalizedEvent, NormalizedEventBuilder, RawEvent};
pub use ids::{EventId, RoomId, ServerName, UserId};
pub use ports::{ActionExecutor, ManagementNotifier, PowerLevelSource, StaticPowerLevels};
pub use power_levels::PowerLevels;
