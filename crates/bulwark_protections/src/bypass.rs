//! Sender exemptions shared by per-sender protections.

use bulwark_core::{PowerLevels, UserId};
use tracing::trace;

/// Decides whether a sender is exempt from a protection.
///
/// A sender bypasses when their home server is on the ignore list, or when
/// power levels are known and their level is strictly above the configured
/// threshold. Without a threshold, power levels never grant a bypass.
///
/// # Examples
///
/// ```
/// use bulwark_core::{PowerLevels, UserId};
/// use bulwark_protections::BypassPolicy;
/// use std::collections::HashMap;
///
/// let moderator = UserId::new("@mod:example.org");
/// let levels = PowerLevels::new(HashMap::from([(moderator.clone(), 50)]), 0);
///
/// let policy = BypassPolicy::new(&[], Some(49));
/// assert!(policy.can_bypass(&moderator, Some(&levels)));
///
/// let policy = BypassPolicy::new(&[], Some(50));
/// assert!(!policy.can_bypass(&moderator, Some(&levels)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BypassPolicy<'a> {
    ignore_home_servers: &'a [String],
    ignore_power_level_above: Option<i64>,
}

impl<'a> BypassPolicy<'a> {
    /// Creates a policy from a protection's exemption settings.
    pub fn new(ignore_home_servers: &'a [String], ignore_power_level_above: Option<i64>) -> Self {
        Self {
            ignore_home_servers,
            ignore_power_level_above,
        }
    }

    /// Whether `user` is exempt.
    pub fn can_bypass(&self, user: &UserId, power_levels: Option<&PowerLevels>) -> bool {
        if let Some(server) = user.home_server()
            && self.ignore_home_servers.iter().any(|s| s == server)
        {
            trace!(user = %user, server, "Sender home server is exempt");
            return true;
        }

        match (self.ignore_power_level_above, power_levels) {
            (Some(threshold), Some(levels)) => {
                let level = levels.level_for(user);
                let exempt = level > threshold;
                if exempt {
                    trace!(user = %user, level, threshold, "Sender power level is exempt");
                }
                exempt
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn levels(user: &UserId, level: i64) -> PowerLevels {
        PowerLevels::new(HashMap::from([(user.clone(), level)]), 0)
    }

    #[test]
    fn test_power_level_boundary_is_strict() {
        let user = UserId::new("@mod:example.org");
        let policy = BypassPolicy::new(&[], Some(50));
        assert!(!policy.can_bypass(&user, Some(&levels(&user, 50))));
        assert!(policy.can_bypass(&user, Some(&levels(&user, 51))));
    }

    #[test]
    fn test_home_server_allow_list() {
        let servers = vec!["trusted.example".to_string()];
        let policy = BypassPolicy::new(&servers, None);
        assert!(policy.can_bypass(&UserId::new("@a:trusted.example"), None));
        assert!(!policy.can_bypass(&UserId::new("@a:other.example"), None));
        assert!(!policy.can_bypass(&UserId::new("@a:trusted.example.evil"), None));
    }

    #[test]
    fn test_no_threshold_never_bypasses_by_level() {
        let user = UserId::new("@admin:example.org");
        let policy = BypassPolicy::new(&[], None);
        assert!(!policy.can_bypass(&user, Some(&levels(&user, 100))));
    }

    #[test]
    fn test_missing_power_levels_never_bypass_by_level() {
        let user = UserId::new("@admin:example.org");
        let policy = BypassPolicy::new(&[], Some(0));
        assert!(!policy.can_bypass(&user, None));
    }

    #[test]
    fn test_room_default_level_applies() {
        let user = UserId::new("@member:example.org");
        let power_levels = PowerLevels::new(HashMap::new(), 10);
        assert!(BypassPolicy::new(&[], Some(5)).can_bypass(&user, Some(&power_levels)));
    }
}
