//! Engine settings.

use bulwark_core::{RoomId, UserId};
use derive_getters::Getters;
use std::time::Duration;

/// Deadline applied to each dispatch unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Identity and limits the engine runs with.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct EngineSettings {
    /// The bot's own user, whose events are never evaluated
    bot_user_id: UserId,
    /// Room that receives alerts when the bot is mentioned
    #[builder(default, setter(into, strip_option))]
    management_room: Option<RoomId>,
    /// Deadline for each dispatch, bounding capability probes
    #[builder(default = "DEFAULT_REQUEST_TIMEOUT")]
    request_timeout: Duration,
}

impl EngineSettings {
    /// Returns a builder for constructing EngineSettings.
    pub fn builder() -> EngineSettingsBuilder {
        EngineSettingsBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let settings = EngineSettings::builder()
            .bot_user_id("@bulwark:example.org")
            .build()
            .unwrap();
        assert_eq!(*settings.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert!(settings.management_room().is_none());
    }

    #[test]
    fn test_builder_requires_bot_user() {
        assert!(EngineSettings::builder().build().is_err());
    }
}
