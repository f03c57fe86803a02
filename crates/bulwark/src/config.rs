//! Engine configuration loaded from TOML and `BULWARK_*` environment variables.

use bulwark_core::{RoomId, UserId};
use bulwark_engine::EngineSettings;
use bulwark_error::ConfigError;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "BULWARK";

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_probe_user_agent() -> String {
    format!("bulwark/{}", env!("CARGO_PKG_VERSION"))
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Settings for running the engine.
///
/// # Example
///
/// ```toml
/// bot_user_id = "@bulwark:example.org"
/// management_room = "!management:example.org"
/// request_timeout_secs = 30
/// sweep_interval_secs = 300
/// log_format = "json"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct EngineConfig {
    /// The bot's own user
    #[serde(default)]
    bot_user_id: Option<UserId>,
    /// Room that receives bot-mention alerts
    #[serde(default)]
    management_room: Option<RoomId>,
    /// Deadline for each dispatch, in seconds
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    /// Interval of the expired-state sweep, in seconds; zero disables it
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,
    /// User agent sent with capability probes
    #[serde(default = "default_probe_user_agent")]
    probe_user_agent: String,
    /// Log output format
    #[serde(default)]
    log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bot_user_id: None,
            management_room: None,
            request_timeout_secs: default_request_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            probe_user_agent: default_probe_user_agent(),
            log_format: LogFormat::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from an optional TOML file, then `BULWARK_*` environment variables.
    ///
    /// A missing file is not an error; environment variables override file values.
    #[tracing::instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::new(format!("Failed to load engine configuration: {}", e)))
    }

    /// Deadline for each dispatch.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Interval of the expired-state sweep; zero means disabled.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Builds engine settings, which require `bot_user_id`.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let bot_user_id = self
            .bot_user_id
            .clone()
            .ok_or_else(|| ConfigError::new("bot_user_id is required"))?;
        let mut builder = EngineSettings::builder();
        builder
            .bot_user_id(bot_user_id)
            .request_timeout(self.request_timeout());
        if let Some(room) = &self.management_room {
            builder.management_room(room.clone());
        }
        builder
            .build()
            .map_err(|e| ConfigError::new(format!("Invalid engine settings: {}", e)))
    }
}
