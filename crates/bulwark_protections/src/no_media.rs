//! Message type filtering.

use crate::BypassPolicy;
use crate::Verdict;
use bulwark_core::{EventKind, NormalizedEvent, PowerLevels, msgtype};
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::trace;

const MEDIA_URI_SCHEME: &str = "mxc://";
const INLINE_IMAGE_MARKER: &str = "<img";

/// Redacts messages whose type is not on an allow-list.
///
/// When `allowed_types` is unset, text, notices and emotes are allowed. An
/// explicit empty list allows nothing.
///
/// # Examples
///
/// ```
/// use bulwark_core::{EventKind, NormalizedEvent};
/// use bulwark_protections::NoMediaProtection;
///
/// let protection = NoMediaProtection::default().with_enabled(true);
/// let image = NormalizedEvent::builder()
///     .room_id("!room:example.org")
///     .event_id("$image")
///     .sender("@alice:example.org")
///     .kind(EventKind::Message)
///     .msgtype("m.image")
///     .build()
///     .unwrap();
/// assert!(protection.evaluate(&image, None).is_redact());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct NoMediaProtection {
    /// Whether the protection runs
    #[serde(default)]
    enabled: bool,
    /// Home servers whose users are exempt
    #[serde(default)]
    ignore_home_servers: Option<Vec<String>>,
    /// Users above this power level are exempt
    #[serde(default)]
    ignore_power_level_above: Option<i64>,
    /// Allowed message types; unset means the default text types
    #[serde(default)]
    allowed_types: Option<Vec<String>>,
    /// Whether HTML bodies may embed images
    #[serde(default)]
    allow_inline_images: bool,
    /// Whether reactions may use custom (media) emoji
    #[serde(default)]
    allow_custom_reactions: bool,
}

impl NoMediaProtection {
    /// Whether the protection runs.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The sender exemptions for this protection.
    pub fn bypass_policy(&self) -> BypassPolicy<'_> {
        BypassPolicy::new(
            self.ignore_home_servers.as_deref().unwrap_or_default(),
            self.ignore_power_level_above,
        )
    }

    /// Whether `message_type` is on the effective allow-list.
    pub fn allows_type(&self, message_type: &str) -> bool {
        match &self.allowed_types {
            Some(allowed) => allowed.iter().any(|t| t == message_type),
            None => msgtype::DEFAULT_ALLOWED.contains(&message_type),
        }
    }

    /// Decides whether `event` should be redacted.
    pub fn evaluate(&self, event: &NormalizedEvent, power_levels: Option<&PowerLevels>) -> Verdict {
        if self.bypass_policy().can_bypass(event.sender(), power_levels) {
            return Verdict::Pass;
        }

        match event.kind() {
            EventKind::Reaction => {
                let custom = event
                    .relates_to_key()
                    .as_deref()
                    .is_some_and(|key| key.starts_with(MEDIA_URI_SCHEME));
                if custom && !self.allow_custom_reactions {
                    Verdict::redact("custom reactions are not allowed")
                } else {
                    Verdict::Pass
                }
            }
            EventKind::Sticker => self.check_type(msgtype::STICKER),
            EventKind::Message => {
                let declared = event.msgtype().as_deref().unwrap_or_default();
                let verdict = self.check_type(declared);
                if verdict.is_redact() {
                    return verdict;
                }
                if !self.allow_inline_images && has_inline_image(event.formatted_body().as_deref())
                {
                    return Verdict::redact("inline images are not allowed");
                }
                Verdict::Pass
            }
            EventKind::Other => Verdict::Pass,
        }
    }

    fn check_type(&self, message_type: &str) -> Verdict {
        if self.allows_type(message_type) {
            Verdict::Pass
        } else {
            trace!(message_type, "Message type is not allowed");
            Verdict::redact(format!("message type {:?} is not allowed", message_type))
        }
    }
}

fn has_inline_image(formatted_body: Option<&str>) -> bool {
    let marker = INLINE_IMAGE_MARKER.as_bytes();
    formatted_body.is_some_and(|body| {
        body.as_bytes()
            .windows(marker.len())
            .any(|window| window.eq_ignore_ascii_case(marker))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::UserId;
    use std::collections::HashMap;

    fn message(msgtype: &str) -> NormalizedEvent {
        NormalizedEvent::builder()
            .room_id("!room:example.org")
            .event_id("$event")
            .sender("@alice:example.org")
            .kind(EventKind::Message)
            .msgtype(msgtype)
            .build()
            .unwrap()
    }

    fn reaction(key: &str) -> NormalizedEvent {
        NormalizedEvent::builder()
            .room_id("!room:example.org")
            .event_id("$reaction")
            .sender("@alice:example.org")
            .kind(EventKind::Reaction)
            .relates_to_key(key)
            .build()
            .unwrap()
    }

    fn enabled() -> NoMediaProtection {
        NoMediaProtection::default().with_enabled(true)
    }

    #[test]
    fn test_default_types_pass() {
        let protection = enabled();
        for kind in msgtype::DEFAULT_ALLOWED {
            assert_eq!(protection.evaluate(&message(kind), None), Verdict::Pass);
        }
        assert!(protection.evaluate(&message(msgtype::IMAGE), None).is_redact());
    }

    #[test]
    fn test_empty_list_allows_nothing() {
        let protection = enabled().with_allowed_types(Some(vec![]));
        assert!(protection.evaluate(&message(msgtype::TEXT), None).is_redact());
    }

    #[test]
    fn test_custom_list_replaces_defaults() {
        let protection = enabled().with_allowed_types(Some(vec![msgtype::IMAGE.to_string()]));
        assert_eq!(protection.evaluate(&message(msgtype::IMAGE), None), Verdict::Pass);
        assert!(protection.evaluate(&message(msgtype::TEXT), None).is_redact());
    }

    #[test]
    fn test_inline_image_marker() {
        let event = NormalizedEvent::builder()
            .room_id("!room:example.org")
            .event_id("$html")
            .sender("@alice:example.org")
            .kind(EventKind::Message)
            .msgtype(msgtype::TEXT)
            .formatted_body(r#"look <IMG src="mxc://example.org/abc">"#)
            .build()
            .unwrap();
        assert!(enabled().evaluate(&event, None).is_redact());
        assert_eq!(
            enabled().with_allow_inline_images(true).evaluate(&event, None),
            Verdict::Pass
        );
    }

    #[test]
    fn test_sticker_is_image_like() {
        let sticker = NormalizedEvent::builder()
            .room_id("!room:example.org")
            .event_id("$sticker")
            .sender("@alice:example.org")
            .kind(EventKind::Sticker)
            .build()
            .unwrap();
        assert!(enabled().evaluate(&sticker, None).is_redact());
        let allow = enabled().with_allowed_types(Some(vec![msgtype::STICKER.to_string()]));
        assert_eq!(allow.evaluate(&sticker, None), Verdict::Pass);
    }

    #[test]
    fn test_custom_reactions() {
        let media = reaction("mxc://example.org/party");
        assert!(enabled().evaluate(&media, None).is_redact());
        assert_eq!(
            enabled().with_allow_custom_reactions(true).evaluate(&media, None),
            Verdict::Pass
        );
        assert_eq!(enabled().evaluate(&reaction("👍"), None), Verdict::Pass);
    }

    #[test]
    fn test_inline_image_detection() {
        assert!(has_inline_image(Some("<p>hi</p><ImG src=\"mxc://x/y\">")));
        assert!(has_inline_image(Some("<img")));
        assert!(!has_inline_image(Some("<im")));
        assert!(!has_inline_image(Some("an image: <i>mg</i>")));
        assert!(!has_inline_image(None));
    }

    #[test]
    fn test_bypass_skips_evaluation() {
        let sender = UserId::new("@alice:example.org");
        let levels = PowerLevels::new(HashMap::from([(sender, 100)]), 0);
        let protection = enabled().with_ignore_power_level_above(Some(50));
        assert_eq!(
            protection.evaluate(&message(msgtype::IMAGE), Some(&levels)),
            Verdict::Pass
        );

        let exempt = enabled().with_ignore_home_servers(Some(vec!["example.org".to_string()]));
        assert_eq!(exempt.evaluate(&message(msgtype::IMAGE), None), Verdict::Pass);
    }
}
