//! Ports for the collaborators the engine consumes.
//!
//! The transport, state store and management bot live outside this
//! workspace; they plug in by implementing these traits.

use crate::{EventId, PowerLevels, RequestContext, RoomId};
use async_trait::async_trait;
use bulwark_error::ActionError;
use std::collections::HashMap;

/// Read access to room power levels.
#[async_trait]
pub trait PowerLevelSource: Send + Sync {
    /// Fetches the power levels for `room`.
    ///
    /// `Ok(None)` means the room has no known power levels.
    async fn power_levels(
        &self,
        ctx: &RequestContext,
        room: &RoomId,
    ) -> Result<Option<PowerLevels>, ActionError>;
}

/// Performs enforcement actions.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Redacts `event` in `room`.
    async fn redact(
        &self,
        ctx: &RequestContext,
        room: &RoomId,
        event: &EventId,
    ) -> Result<(), ActionError>;
}

/// Posts notices for moderators.
#[async_trait]
pub trait ManagementNotifier: Send + Sync {
    /// Sends `text` to `room`, mentioning the whole room.
    async fn notify(
        &self,
        ctx: &RequestContext,
        room: &RoomId,
        text: &str,
    ) -> Result<(), ActionError>;
}

/// Power levels held in memory, keyed by room.
#[derive(Debug, Clone, Default)]
pub struct StaticPowerLevels {
    rooms: HashMap<RoomId, PowerLevels>,
}

impl StaticPowerLevels {
    /// Creates a source from a room map.
    pub fn new(rooms: HashMap<RoomId, PowerLevels>) -> Self {
        Self { rooms }
    }

    /// Sets the power levels for a room.
    pub fn insert(&mut self, room: RoomId, levels: PowerLevels) {
        self.rooms.insert(room, levels);
    }
}

#[async_trait]
impl PowerLevelSource for StaticPowerLevels {
    async fn power_levels(
        &self,
        _ctx: &RequestContext,
        room: &RoomId,
    ) -> Result<Option<PowerLevels>, ActionError> {
        Ok(self.rooms.get(room).cloned())
    }
}
