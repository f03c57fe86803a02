//! Sliding-window mention counters.

use crate::ProtectionScope;
use bulwark_core::{Clock, UserId};
use derive_getters::Getters;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Mentions counted for one sender within one window.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MentionCounter {
    /// Mentions counted in the window
    hits: u64,
    /// Enforcements recorded in the window
    infractions: u64,
    /// When the window opened
    start: Instant,
    /// When the window closes
    expires: Instant,
}

impl MentionCounter {
    fn new(now: Instant, period: Duration) -> Self {
        Self {
            hits: 0,
            infractions: 0,
            start: now,
            expires: window_end(now, period),
        }
    }

    /// Whether the window has closed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires
    }

    /// Whether the window is still open at `now`.
    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires
    }
}

/// `now + period`, saturating at the latest instant the platform can represent.
fn window_end(now: Instant, mut period: Duration) -> Instant {
    loop {
        match now.checked_add(period) {
            Some(end) => return end,
            None => period /= 2,
        }
    }
}

type CounterKey = (ProtectionScope, UserId);

/// Mention counters keyed by protection scope and sender.
///
/// Expired counters are dropped lazily on access; [`sweep_expired`] removes
/// the ones nobody touches again.
///
/// [`sweep_expired`]: MentionCounterStore::sweep_expired
pub struct MentionCounterStore {
    counters: Mutex<HashMap<CounterKey, MentionCounter>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for MentionCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionCounterStore")
            .field("counters", &self.counters.lock().len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl MentionCounterStore {
    /// Creates an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Adds `mentions` to the sender's counter, opening a new window if none is live.
    ///
    /// Returns the counter after the update.
    pub fn increment(
        &self,
        scope: &ProtectionScope,
        user: &UserId,
        mentions: u64,
        period: Duration,
    ) -> MentionCounter {
        let now = self.clock.now();
        let mut counters = self.counters.lock();
        let counter = counters
            .entry((scope.clone(), user.clone()))
            .or_insert_with(|| MentionCounter::new(now, period));
        if counter.is_expired(now) {
            trace!(%scope, user = %user, "Mention window expired, starting a new one");
            *counter = MentionCounter::new(now, period);
        }
        counter.hits = counter.hits.saturating_add(mentions);
        counter.clone()
    }

    /// Records one enforcement against the sender, saturating at `max_infractions`.
    pub fn record_infraction(
        &self,
        scope: &ProtectionScope,
        user: &UserId,
        max_infractions: u64,
        period: Duration,
    ) -> MentionCounter {
        let now = self.clock.now();
        let mut counters = self.counters.lock();
        let counter = counters
            .entry((scope.clone(), user.clone()))
            .or_insert_with(|| MentionCounter::new(now, period));
        if counter.is_expired(now) {
            *counter = MentionCounter::new(now, period);
        }
        counter.infractions = counter.infractions.saturating_add(1).min(max_infractions);
        counter.clone()
    }

    /// Returns the sender's live counter, if any.
    pub fn get(&self, scope: &ProtectionScope, user: &UserId) -> Option<MentionCounter> {
        let now = self.clock.now();
        let mut counters = self.counters.lock();
        let key = (scope.clone(), user.clone());
        match counters.get(&key) {
            Some(counter) if counter.is_expired(now) => {
                counters.remove(&key);
                None
            }
            Some(counter) => Some(counter.clone()),
            None => None,
        }
    }

    /// Removes every expired counter, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut counters = self.counters.lock();
        let before = counters.len();
        counters.retain(|_, counter| !counter.is_expired(now));
        let removed = before - counters.len();
        if removed > 0 {
            debug!(removed, remaining = counters.len(), "Swept expired mention counters");
        }
        removed
    }

    /// Number of stored counters, live or not yet swept.
    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    /// Whether the store holds no counters.
    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }
}
