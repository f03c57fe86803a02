//! Cached server requirement verdicts.

use crate::RegistrationRequirements;
use bulwark_core::{Clock, ServerName};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a server verdict stays cached.
pub const CAPABILITY_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct CachedVerdict {
    verdict: bool,
    expires: Instant,
}

type CacheKey = (RegistrationRequirements, ServerName);

/// Verdicts keyed by requirement set and server.
///
/// Protections with identical requirements share entries, so a snapshot
/// update that keeps the requirements keeps the cache warm.
pub struct CapabilityCache {
    entries: Mutex<HashMap<CacheKey, CachedVerdict>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CapabilityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityCache")
            .field("entries", &self.entries.lock().len())
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .finish()
    }
}

impl CapabilityCache {
    /// Creates an empty cache with the standard TTL.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, CAPABILITY_TTL)
    }

    /// Creates an empty cache with a custom TTL.
    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Returns the cached verdict, dropping it if it has expired.
    pub fn get(&self, requirements: &RegistrationRequirements, server: &ServerName) -> Option<bool> {
        let now = self.clock.now();
        let key = (*requirements, server.clone());
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if now >= entry.expires => {
                entries.remove(&key);
                None
            }
            Some(entry) => Some(entry.verdict),
            None => None,
        }
    }

    /// Stores a verdict for the TTL, replacing any previous one.
    pub fn insert(&self, requirements: RegistrationRequirements, server: ServerName, verdict: bool) {
        let expires = self.clock.now() + self.ttl;
        self.entries
            .lock()
            .insert((requirements, server), CachedVerdict { verdict, expires });
    }

    /// Removes every expired verdict, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Swept expired server verdicts");
        }
        removed
    }

    /// Number of stored verdicts, live or not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no verdicts.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::MockClock;

    fn captcha() -> RegistrationRequirements {
        RegistrationRequirements {
            captcha: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_verdict_expires_after_ttl() {
        let clock = MockClock::default();
        let cache = CapabilityCache::new(Arc::new(clock.clone()));
        let server = ServerName::new("example.org");

        cache.insert(captcha(), server.clone(), true);
        clock.advance(CAPABILITY_TTL - Duration::from_secs(1));
        assert_eq!(cache.get(&captcha(), &server), Some(true));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get(&captcha(), &server), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_requirement_sets_are_separate_keys() {
        let cache = CapabilityCache::new(Arc::new(MockClock::default()));
        let server = ServerName::new("example.org");
        cache.insert(captcha(), server.clone(), false);
        assert_eq!(cache.get(&RegistrationRequirements::default(), &server), None);
        assert_eq!(cache.get(&captcha(), &server), Some(false));
    }

    #[test]
    fn test_sweep_removes_expired() {
        let clock = MockClock::default();
        let cache = CapabilityCache::with_ttl(Arc::new(clock.clone()), Duration::from_secs(10));
        cache.insert(captcha(), ServerName::new("a.example"), true);
        clock.advance(Duration::from_secs(5));
        cache.insert(captcha(), ServerName::new("b.example"), true);
        clock.advance(Duration::from_secs(6));
        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
