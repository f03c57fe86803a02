//! Periodic removal of expired protection state.

use bulwark_protections::ProtectionState;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One background task that sweeps every state store.
///
/// Lookups already ignore expired entries; sweeping only bounds memory held
/// by senders and servers that are never seen again.
#[derive(Debug)]
pub struct StateSweeper {
    state: ProtectionState,
    interval: Duration,
    shutdown_token: CancellationToken,
}

impl StateSweeper {
    /// Creates a sweeper over `state`, stopped by `shutdown_token`.
    pub fn new(state: ProtectionState, interval: Duration, shutdown_token: CancellationToken) -> Self {
        Self {
            state,
            interval,
            shutdown_token,
        }
    }

    /// A handle that stops the sweeper when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Spawns the sweep loop.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(&self) {
        if self.interval.is_zero() {
            info!("State sweeper is disabled");
            return;
        }
        info!(interval_secs = self.interval.as_secs(), "Starting state sweeper");

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let removed = self.state.sweep_expired();
                    debug!(removed, "State sweep completed");
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping state sweeper");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bulwark_core::{MockClock, ServerName, UserId};
    use bulwark_error::{ProbeError, ProbeErrorKind};
    use bulwark_probe::{RegistrationProbe, ServerDiscovery, UserInteractiveFlows};
    use bulwark_protections::ProtectionScope;
    use std::sync::Arc;

    struct NoNetwork;

    #[async_trait]
    impl ServerDiscovery for NoNetwork {
        async fn discover(&self, _server: &ServerName) -> Result<Option<String>, ProbeError> {
            Ok(None)
        }
    }

    #[async_trait]
    impl RegistrationProbe for NoNetwork {
        async fn auth_metadata(&self, _base_url: &str) -> Result<(), ProbeError> {
            Err(ProbeError::new(ProbeErrorKind::Transport("offline".into())))
        }

        async fn register(&self, _base_url: &str) -> Result<Option<UserInteractiveFlows>, ProbeError> {
            Err(ProbeError::new(ProbeErrorKind::Transport("offline".into())))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_and_stops() {
        let clock = MockClock::default();
        let state = ProtectionState::new(Arc::new(clock.clone()), Arc::new(NoNetwork), Arc::new(NoNetwork));
        state.mention_counters().increment(
            &ProtectionScope::Global,
            &UserId::new("@gone:example.org"),
            1,
            Duration::from_secs(60),
        );
        clock.advance(Duration::from_secs(61));

        let token = CancellationToken::new();
        let handle = StateSweeper::new(state.clone(), Duration::from_secs(10), token.clone()).start();
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(state.mention_counters().is_empty());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_interval_disables() {
        let clock = MockClock::default();
        let state = ProtectionState::new(Arc::new(clock), Arc::new(NoNetwork), Arc::new(NoNetwork));
        let handle = StateSweeper::new(state, Duration::ZERO, CancellationToken::new()).start();
        handle.await.unwrap();
    }
}
