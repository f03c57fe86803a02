//! Results of dispatch and configuration updates.

use bulwark_core::{EventId, RoomId};
use bulwark_error::BulwarkError;
use bulwark_protections::ProtectionKind;
use derive_getters::Getters;

/// An action the engine performed for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The event was redacted.
    Redact {
        /// Room of the redacted event
        room_id: RoomId,
        /// The redacted event
        event_id: EventId,
        /// Every protection that asked for the redaction
        protections: Vec<ProtectionKind>,
        /// Their reasons, in the same order
        reasons: Vec<String>,
    },
    /// Moderators were alerted that the bot was mentioned.
    Alert {
        /// Room the alert was posted to
        management_room: RoomId,
        /// Room of the mentioning event
        room_id: RoomId,
        /// The mentioning event
        event_id: EventId,
    },
}

impl Action {
    /// Whether this is a redaction.
    pub fn is_redact(&self) -> bool {
        matches!(self, Action::Redact { .. })
    }
}

/// What one dispatch call did and what went wrong along the way.
#[derive(Debug, Default, Getters)]
pub struct DispatchReport {
    /// Performed actions
    actions: Vec<Action>,
    /// Errors that were logged and swallowed
    errors: Vec<BulwarkError>,
}

impl DispatchReport {
    pub(crate) fn push_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub(crate) fn push_error(&mut self, error: impl Into<BulwarkError>) {
        self.errors.push(error.into());
    }

    /// Whether nothing happened and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.errors.is_empty()
    }

    /// Consumes the report, returning actions and errors.
    pub fn into_parts(self) -> (Vec<Action>, Vec<BulwarkError>) {
        (self.actions, self.errors)
    }
}

/// Status of a protections update, for surfacing in a management room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct UpdateOutcome {
    /// Human-readable status lines
    messages: Vec<String>,
    /// Human-readable errors; non-empty means the previous snapshot was kept
    errors: Vec<String>,
}

impl UpdateOutcome {
    pub(crate) fn applied(messages: Vec<String>) -> Self {
        Self {
            messages,
            errors: Vec::new(),
        }
    }

    pub(crate) fn rejected(error: String) -> Self {
        Self {
            messages: Vec::new(),
            errors: vec![error],
        }
    }

    /// Whether the update was applied.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
