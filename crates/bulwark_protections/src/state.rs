//! Engine-owned protection state.

use crate::{CapabilityCache, MentionCounterStore, ServerRequirementsChecker};
use bulwark_core::Clock;
use bulwark_probe::{RegistrationProbe, ServerDiscovery};
use std::sync::Arc;

/// Mutable state shared by every protection instance.
///
/// State is keyed independently of the configuration snapshot, so replacing
/// the snapshot keeps live counters and cached verdicts.
#[derive(Debug, Clone)]
pub struct ProtectionState {
    mention_counters: Arc<MentionCounterStore>,
    server_checker: ServerRequirementsChecker,
}

impl ProtectionState {
    /// Creates empty state over the given clock and probe ports.
    pub fn new(
        clock: Arc<dyn Clock>,
        discovery: Arc<dyn ServerDiscovery>,
        probe: Arc<dyn RegistrationProbe>,
    ) -> Self {
        let cache = Arc::new(CapabilityCache::new(clock.clone()));
        Self {
            mention_counters: Arc::new(MentionCounterStore::new(clock)),
            server_checker: ServerRequirementsChecker::new(discovery, probe, cache),
        }
    }

    /// Mention counters.
    pub fn mention_counters(&self) -> &Arc<MentionCounterStore> {
        &self.mention_counters
    }

    /// Server requirements checker and its verdict cache.
    pub fn server_checker(&self) -> &ServerRequirementsChecker {
        &self.server_checker
    }

    /// Drops expired counters and verdicts, returning how many entries were removed.
    pub fn sweep_expired(&self) -> usize {
        self.mention_counters.sweep_expired() + self.server_checker.cache().sweep_expired()
    }
}
