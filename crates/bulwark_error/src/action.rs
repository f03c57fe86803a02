//! Errors raised by external collaborators (state store, action executor, notifier).

/// Error kinds for collaborator calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ActionErrorKind {
    /// Redacting an event failed.
    #[display("Failed to redact {event} in {room}: {reason}")]
    Redact {
        /// Room the event belongs to
        room: String,
        /// Event that could not be redacted
        event: String,
        /// Reason reported by the executor
        reason: String,
    },
    /// Sending a management notice failed.
    #[display("Failed to notify {room}: {reason}")]
    Notify {
        /// Target room
        room: String,
        /// Reason reported by the notifier
        reason: String,
    },
    /// Fetching power levels failed.
    #[display("Failed to get power levels for {room}: {reason}")]
    PowerLevels {
        /// Room whose power levels were requested
        room: String,
        /// Reason reported by the state source
        reason: String,
    },
}

/// Collaborator error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Action Error: {} at line {} in {}", kind, line, file)]
pub struct ActionError {
    kind: ActionErrorKind,
    line: u32,
    file: &'static str,
}

impl ActionError {
    /// Create a new action error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ActionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ActionErrorKind {
        &self.kind
    }
}
