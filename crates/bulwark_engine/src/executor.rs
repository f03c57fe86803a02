//! Action executor that only logs.

use async_trait::async_trait;
use bulwark_core::{ActionExecutor, EventId, ManagementNotifier, RequestContext, RoomId};
use bulwark_error::ActionError;
use tracing::info;

/// Executor for dry runs: logs each action instead of performing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingExecutor;

#[async_trait]
impl ActionExecutor for LoggingExecutor {
    async fn redact(
        &self,
        _ctx: &RequestContext,
        room: &RoomId,
        event: &EventId,
    ) -> Result<(), ActionError> {
        info!(room_id = %room, event_id = %event, "Would redact event");
        Ok(())
    }
}

#[async_trait]
impl ManagementNotifier for LoggingExecutor {
    async fn notify(
        &self,
        _ctx: &RequestContext,
        room: &RoomId,
        text: &str,
    ) -> Result<(), ActionError> {
        info!(room_id = %room, text, "Would send notice");
        Ok(())
    }
}
