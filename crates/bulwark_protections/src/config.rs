//! Persisted protection configuration.

use crate::{
    MaxMentionsProtection, NoMediaProtection, Protection, ServerRequirementsProtection,
};
use bulwark_core::RoomId;
use bulwark_error::ConfigError;
use derive_getters::Getters;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Treats an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Root configuration snapshot: a global protection set plus per-room overrides.
///
/// A room with an override uses that set verbatim; nothing from the global
/// set is merged into it.
///
/// # Examples
///
/// ```
/// use bulwark_core::RoomId;
/// use bulwark_protections::{ProtectionScope, Protections};
///
/// let protections = Protections::from_json(r#"{
///     "global": { "no_media": { "enabled": true } },
///     "overrides": { "!art:example.org": { "no_media": { "enabled": false } } }
/// }"#).unwrap();
///
/// let (scope, set) = protections.effective_set(&RoomId::new("!art:example.org")).unwrap();
/// assert_eq!(scope, ProtectionScope::Room(RoomId::new("!art:example.org")));
/// assert!(!set.no_media().is_enabled());
///
/// let (scope, set) = protections.effective_set(&RoomId::new("!chat:example.org")).unwrap();
/// assert_eq!(scope, ProtectionScope::Global);
/// assert!(set.no_media().is_enabled());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct Protections {
    /// Protections for rooms without an override
    #[serde(default)]
    global: Option<ProtectionSet>,
    /// Per-room replacements for the global set
    #[serde(default, deserialize_with = "null_as_default")]
    overrides: HashMap<RoomId, ProtectionSet>,
}

impl Protections {
    /// Creates a snapshot.
    pub fn new(global: Option<ProtectionSet>, overrides: HashMap<RoomId, ProtectionSet>) -> Self {
        Self { global, overrides }
    }

    /// Parses a snapshot from its JSON wire form.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse protections: {}", e)))
    }

    /// Parses a snapshot from raw JSON bytes.
    pub fn from_slice(content: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse protections: {}", e)))
    }

    /// Serializes the snapshot to its JSON wire form.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self)
            .map_err(|e| ConfigError::new(format!("Failed to serialize protections: {}", e)))
    }

    /// Resolves the set that applies to `room`: its override if present, else the global set.
    pub fn effective_set(&self, room: &RoomId) -> Option<(ProtectionScope, &ProtectionSet)> {
        if let Some(set) = self.overrides.get(room) {
            return Some((ProtectionScope::Room(room.clone()), set));
        }
        self.global
            .as_ref()
            .map(|set| (ProtectionScope::Global, set))
    }
}

/// Which configuration a protection instance came from.
///
/// Stateful protections key their state by scope, so the global set and each
/// override keep separate counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProtectionScope {
    /// The global set
    #[display("global")]
    Global,
    /// A room override
    #[display("room {_0}")]
    Room(RoomId),
}

/// The protections configured for one scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct ProtectionSet {
    /// Message type filtering
    #[serde(default)]
    no_media: NoMediaProtection,
    /// Mention limiting
    #[serde(default)]
    max_mentions: Option<MaxMentionsProtection>,
    /// Remote server registration requirements
    #[serde(default)]
    server_requirements: Option<ServerRequirementsProtection>,
}

impl ProtectionSet {
    /// Creates a set.
    pub fn new(
        no_media: NoMediaProtection,
        max_mentions: Option<MaxMentionsProtection>,
        server_requirements: Option<ServerRequirementsProtection>,
    ) -> Self {
        Self {
            no_media,
            max_mentions,
            server_requirements,
        }
    }

    /// Every configured protection, in evaluation order.
    pub fn protections(&self) -> Vec<Protection<'_>> {
        let mut protections = vec![Protection::NoMedia(&self.no_media)];
        if let Some(max_mentions) = &self.max_mentions {
            protections.push(Protection::MaxMentions(max_mentions));
        }
        if let Some(server_requirements) = &self.server_requirements {
            protections.push(Protection::ServerRequirements(server_requirements));
        }
        protections
    }

    /// The enabled protections, in evaluation order.
    pub fn enabled(&self) -> Vec<Protection<'_>> {
        self.protections()
            .into_iter()
            .filter(Protection::is_enabled)
            .collect()
    }
}
