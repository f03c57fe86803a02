//! The closed set of protection kinds and their common evaluation contract.

use crate::{
    MaxMentionsProtection, NoMediaProtection, ProtectionScope, ProtectionState,
    ServerRequirementsProtection,
};
use bulwark_core::{EventKind, NormalizedEvent, PowerLevels, RequestContext};
use bulwark_error::BulwarkError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Discriminator for the protection kinds, matching their wire field names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProtectionKind {
    /// Message type filtering
    NoMedia,
    /// Mention limiting
    MaxMentions,
    /// Remote server registration requirements
    ServerRequirements,
}

impl ProtectionKind {
    /// Whether protections of this kind look at events of `kind`.
    ///
    /// Reactions only reach media-oriented protections.
    pub fn applies_to(self, kind: EventKind) -> bool {
        match self {
            ProtectionKind::NoMedia => matches!(
                kind,
                EventKind::Message | EventKind::Sticker | EventKind::Reaction
            ),
            ProtectionKind::MaxMentions | ProtectionKind::ServerRequirements => {
                matches!(kind, EventKind::Message | EventKind::Sticker)
            }
        }
    }

    /// Whether evaluation consults the sender's power level.
    pub fn uses_power_levels(self) -> bool {
        matches!(self, ProtectionKind::NoMedia | ProtectionKind::MaxMentions)
    }
}

/// Outcome of evaluating one protection against one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Leave the event alone.
    Pass,
    /// Redact the event.
    Redact {
        /// Human-readable reason
        reason: String,
    },
}

impl Verdict {
    /// Creates a redact verdict.
    pub fn redact(reason: impl Into<String>) -> Self {
        Verdict::Redact {
            reason: reason.into(),
        }
    }

    /// Whether the verdict asks for a redaction.
    pub fn is_redact(&self) -> bool {
        matches!(self, Verdict::Redact { .. })
    }
}

/// Everything a protection may read while evaluating one event.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<'a> {
    /// Request context bounding any network calls
    pub ctx: &'a RequestContext,
    /// The event under evaluation
    pub event: &'a NormalizedEvent,
    /// Scope of the configuration the protection came from
    pub scope: &'a ProtectionScope,
    /// Power levels of the event's room, if they could be fetched
    pub power_levels: Option<&'a PowerLevels>,
    /// Engine-owned protection state
    pub state: &'a ProtectionState,
}

/// A configured protection, borrowed from a snapshot.
#[derive(Debug, Clone, Copy)]
pub enum Protection<'a> {
    /// Message type filtering
    NoMedia(&'a NoMediaProtection),
    /// Mention limiting
    MaxMentions(&'a MaxMentionsProtection),
    /// Remote server registration requirements
    ServerRequirements(&'a ServerRequirementsProtection),
}

impl Protection<'_> {
    /// The protection's kind.
    pub fn kind(&self) -> ProtectionKind {
        match self {
            Protection::NoMedia(_) => ProtectionKind::NoMedia,
            Protection::MaxMentions(_) => ProtectionKind::MaxMentions,
            Protection::ServerRequirements(_) => ProtectionKind::ServerRequirements,
        }
    }

    /// Whether the protection is switched on.
    pub fn is_enabled(&self) -> bool {
        match self {
            Protection::NoMedia(p) => p.is_enabled(),
            Protection::MaxMentions(p) => p.is_enabled(),
            Protection::ServerRequirements(p) => p.is_enabled(),
        }
    }

    /// Evaluates the protection against `input.event`.
    ///
    /// Only capability probes can fail; the other kinds always produce a verdict.
    #[tracing::instrument(
        skip(self, input),
        fields(protection = %self.kind(), event_id = %input.event.event_id())
    )]
    pub async fn evaluate(&self, input: &Evaluation<'_>) -> Result<Verdict, BulwarkError> {
        match self {
            Protection::NoMedia(p) => Ok(p.evaluate(input.event, input.power_levels)),
            Protection::MaxMentions(p) => Ok(p.evaluate(
                input.event,
                input.power_levels,
                input.scope,
                input.state.mention_counters(),
            )),
            Protection::ServerRequirements(p) => Ok(p
                .evaluate(input.ctx, input.event, input.state.server_checker())
                .await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_kind_names_match_wire_fields() {
        let names: Vec<String> = ProtectionKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["no_media", "max_mentions", "server_requirements"]);
        assert_eq!(
            "max_mentions".parse::<ProtectionKind>().unwrap(),
            ProtectionKind::MaxMentions
        );
    }

    #[test]
    fn test_reactions_only_reach_media_protections() {
        let applicable: Vec<_> = ProtectionKind::iter()
            .filter(|k| k.applies_to(EventKind::Reaction))
            .collect();
        assert_eq!(applicable, vec![ProtectionKind::NoMedia]);
        assert!(ProtectionKind::iter().all(|k| !k.applies_to(EventKind::Other)));
    }
}
