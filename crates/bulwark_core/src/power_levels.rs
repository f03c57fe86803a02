//! Room power levels.

use crate::UserId;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The user-level part of a room's power levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PowerLevels {
    /// Explicit levels by user
    #[serde(default)]
    users: HashMap<UserId, i64>,
    /// Level of users without an explicit entry
    #[serde(default)]
    users_default: i64,
}

impl PowerLevels {
    /// Creates power levels from explicit entries and a default.
    pub fn new(users: HashMap<UserId, i64>, users_default: i64) -> Self {
        Self {
            users,
            users_default,
        }
    }

    /// Effective level of `user`: the explicit entry, or the room default.
    ///
    /// ```
    /// use bulwark_core::{PowerLevels, UserId};
    /// use std::collections::HashMap;
    ///
    /// let admin = UserId::new("@admin:example.org");
    /// let levels = PowerLevels::new(HashMap::from([(admin.clone(), 100)]), 0);
    /// assert_eq!(levels.level_for(&admin), 100);
    /// assert_eq!(levels.level_for(&UserId::new("@guest:example.org")), 0);
    /// ```
    pub fn level_for(&self, user: &UserId) -> i64 {
        self.users.get(user).copied().unwrap_or(self.users_default)
    }
}
