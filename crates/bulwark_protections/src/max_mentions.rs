//! Mention limiting.

use crate::{BypassPolicy, MentionCounterStore, ProtectionScope, Verdict};
use bulwark_core::{NormalizedEvent, PowerLevels};
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// Redacts messages that mention too many users.
///
/// With a non-positive `period`, each message is judged alone. With a
/// positive `period` (seconds), mentions accumulate per sender in a window
/// that opens on the first counted mention.
///
/// # Examples
///
/// ```
/// use bulwark_protections::MaxMentionsProtection;
///
/// let protection = MaxMentionsProtection::default()
///     .with_enabled(true)
///     .with_max_mentions(5)
///     .with_period(60);
/// assert!(protection.is_enabled());
/// assert!(protection.is_windowed());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct MaxMentionsProtection {
    /// Whether the protection runs
    #[serde(default)]
    enabled: bool,
    /// Mentions at or above this count are redacted
    #[serde(default)]
    max_mentions: i64,
    /// Upper bound of the infraction counter, if infractions are tracked
    #[serde(default)]
    max_infractions: Option<i64>,
    /// Window length in seconds; zero or negative means per-message
    #[serde(default)]
    period: i64,
    /// Users above this power level are exempt
    #[serde(default)]
    ignore_power_level_above: Option<i64>,
    /// Home servers whose users are exempt
    #[serde(default)]
    ignore_home_servers: Option<Vec<String>>,
}

impl MaxMentionsProtection {
    /// Whether the protection runs; a non-positive limit disables it.
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.max_mentions > 0
    }

    /// Whether mentions are counted across messages.
    pub fn is_windowed(&self) -> bool {
        self.period > 0
    }

    /// The sender exemptions for this protection.
    pub fn bypass_policy(&self) -> BypassPolicy<'_> {
        BypassPolicy::new(
            self.ignore_home_servers.as_deref().unwrap_or_default(),
            self.ignore_power_level_above,
        )
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.period.max(0).unsigned_abs())
    }

    /// Decides whether `event` should be redacted, updating the sender's counter in windowed mode.
    pub fn evaluate(
        &self,
        event: &NormalizedEvent,
        power_levels: Option<&PowerLevels>,
        scope: &ProtectionScope,
        counters: &MentionCounterStore,
    ) -> Verdict {
        if self.max_mentions <= 0 {
            return Verdict::Pass;
        }
        let limit = self.max_mentions.unsigned_abs();

        let mentions = event.mention_count() as u64;
        if mentions == 0 {
            return Verdict::Pass;
        }

        if self.bypass_policy().can_bypass(event.sender(), power_levels) {
            return Verdict::Pass;
        }

        if !self.is_windowed() {
            trace!(mentions, limit, "Checking mentions in a single message");
            return if mentions >= limit {
                Verdict::redact(format!("{} mentions in one message", mentions))
            } else {
                Verdict::Pass
            };
        }

        let window = self.window();
        let counter = counters.increment(scope, event.sender(), mentions, window);
        let now = counters.now();
        trace!(
            hits = *counter.hits(),
            limit,
            sender = %event.sender(),
            "Updated mention counter"
        );
        if *counter.hits() < limit || !counter.is_active(now) {
            return Verdict::Pass;
        }

        if let Some(max_infractions) = self.max_infractions.filter(|m| *m > 0) {
            let counter = counters.record_infraction(
                scope,
                event.sender(),
                max_infractions.unsigned_abs(),
                window,
            );
            debug!(
                infractions = *counter.infractions(),
                max_infractions,
                sender = %event.sender(),
                "Recorded mention infraction"
            );
        }
        Verdict::redact(format!(
            "{} mentions within {} seconds",
            counter.hits(),
            self.period
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::{EventKind, Mentions, MockClock, UserId};
    use std::sync::Arc;

    fn mentioning(count: usize) -> NormalizedEvent {
        let users = (0..count)
            .map(|i| UserId::new(format!("@user{}:example.org", i)))
            .collect();
        NormalizedEvent::builder()
            .room_id("!room:example.org")
            .event_id("$event")
            .sender("@spam:example.org")
            .kind(EventKind::Message)
            .msgtype("m.text")
            .mentions(Mentions::new(users, false))
            .build()
            .unwrap()
    }

    fn store() -> (MockClock, MentionCounterStore) {
        let clock = MockClock::default();
        let store = MentionCounterStore::new(Arc::new(clock.clone()));
        (clock, store)
    }

    fn protection(max: i64, period: i64) -> MaxMentionsProtection {
        MaxMentionsProtection::default()
            .with_enabled(true)
            .with_max_mentions(max)
            .with_period(period)
    }

    #[test]
    fn test_per_message_threshold_is_inclusive() {
        let (_clock, store) = store();
        let p = protection(5, 0);
        assert!(p
            .evaluate(&mentioning(5), None, &ProtectionScope::Global, &store)
            .is_redact());
        assert_eq!(
            p.evaluate(&mentioning(4), None, &ProtectionScope::Global, &store),
            Verdict::Pass
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_windowed_accumulates() {
        let (clock, store) = store();
        let p = protection(5, 60);
        assert_eq!(
            p.evaluate(&mentioning(3), None, &ProtectionScope::Global, &store),
            Verdict::Pass
        );
        clock.advance(Duration::from_secs(30));
        assert!(p
            .evaluate(&mentioning(3), None, &ProtectionScope::Global, &store)
            .is_redact());
    }

    #[test]
    fn test_windowed_resets_after_expiry() {
        let (clock, store) = store();
        let p = protection(5, 60);
        p.evaluate(&mentioning(3), None, &ProtectionScope::Global, &store);
        clock.advance(Duration::from_secs(61));
        assert_eq!(
            p.evaluate(&mentioning(3), None, &ProtectionScope::Global, &store),
            Verdict::Pass
        );
    }

    #[test]
    fn test_non_positive_limit_disables() {
        let (_clock, store) = store();
        let p = protection(0, 0);
        assert!(!p.is_enabled());
        assert_eq!(
            p.evaluate(&mentioning(10), None, &ProtectionScope::Global, &store),
            Verdict::Pass
        );
    }

    #[test]
    fn test_bypass_does_not_touch_counters() {
        let (_clock, store) = store();
        let p = protection(5, 60).with_ignore_home_servers(Some(vec!["example.org".to_string()]));
        assert_eq!(
            p.evaluate(&mentioning(9), None, &ProtectionScope::Global, &store),
            Verdict::Pass
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_message_without_mentions_is_ignored() {
        let (_clock, store) = store();
        let p = protection(1, 60);
        assert_eq!(
            p.evaluate(&mentioning(0), None, &ProtectionScope::Global, &store),
            Verdict::Pass
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_infractions_counted_on_enforcement() {
        let (_clock, store) = store();
        let p = protection(2, 60).with_max_infractions(Some(2));
        for _ in 0..4 {
            assert!(p
                .evaluate(&mentioning(2), None, &ProtectionScope::Global, &store)
                .is_redact());
        }
        let counter = store
            .get(&ProtectionScope::Global, &UserId::new("@spam:example.org"))
            .unwrap();
        assert_eq!(*counter.infractions(), 2);
        assert_eq!(*counter.hits(), 8);
    }

    #[test]
    fn test_oversized_period_keeps_counting() {
        let (clock, store) = store();
        let p: MaxMentionsProtection = serde_json::from_str(
            r#"{"enabled": true, "max_mentions": 5, "period": 9223372036854775807}"#,
        )
        .unwrap();
        assert_eq!(
            p.evaluate(&mentioning(3), None, &ProtectionScope::Global, &store),
            Verdict::Pass
        );
        clock.advance(Duration::from_secs(3600));
        assert!(p
            .evaluate(&mentioning(3), None, &ProtectionScope::Global, &store)
            .is_redact());
    }

    #[test]
    fn test_unset_home_servers_stay_null() {
        let p: MaxMentionsProtection =
            serde_json::from_str(r#"{"enabled": true, "ignore_home_servers": null}"#).unwrap();
        assert_eq!(*p.ignore_home_servers(), None);
        let encoded = serde_json::to_value(&p).unwrap();
        assert!(encoded["ignore_home_servers"].is_null());
    }
}
