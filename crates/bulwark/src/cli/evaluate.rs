//! Dry-run dispatch command handler.

use bulwark::{
    Action, EngineConfig, HttpProbeClient, LoggingExecutor, NormalizedEvent, PowerLevels,
    ProtectionEngine, ProtectionState, RawEvent, RoomId, StaticPowerLevels, SystemClock,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn load_power_levels(path: Option<&Path>) -> anyhow::Result<StaticPowerLevels> {
    let Some(path) = path else {
        return Ok(StaticPowerLevels::default());
    };
    let content = std::fs::read(path)?;
    let rooms: HashMap<RoomId, PowerLevels> = serde_json::from_slice(&content)?;
    Ok(StaticPowerLevels::new(rooms))
}

/// Replays events from a JSON-lines file through an engine that only logs its actions.
#[tracing::instrument(skip_all, fields(protections = %protections.display(), events = %events.display()))]
pub async fn handle_evaluate_command(
    config: &EngineConfig,
    protections: &Path,
    events: &Path,
    power_levels: Option<&Path>,
) -> anyhow::Result<()> {
    let probe = Arc::new(HttpProbeClient::new(config.probe_user_agent())?);
    let state = ProtectionState::new(Arc::new(SystemClock::new()), probe.clone(), probe);
    let executor = Arc::new(LoggingExecutor);
    let engine = ProtectionEngine::new(
        config.engine_settings()?,
        state,
        Arc::new(load_power_levels(power_levels)?),
        executor.clone(),
    )
    .with_notifier(executor);

    let outcome = engine.update_protections(&std::fs::read(protections)?);
    if !outcome.is_ok() {
        anyhow::bail!("{}", outcome.errors().join("; "));
    }
    for message in outcome.messages() {
        info!("{}", message);
    }

    let shutdown = CancellationToken::new();
    let sweeper = engine.spawn_sweeper(config.sweep_interval(), shutdown.clone());

    let mut dispatched = 0usize;
    let mut redacted = 0usize;
    for (number, line) in std::fs::read_to_string(events)?.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawEvent = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(line = number + 1, error = %e, "Skipping malformed event");
                continue;
            }
        };
        let event = NormalizedEvent::from(raw);
        let report = engine.dispatch(&event).await;
        dispatched += 1;
        for action in report.actions() {
            if let Action::Redact {
                event_id,
                protections,
                reasons,
                ..
            } = action
            {
                redacted += 1;
                let names: Vec<String> = protections.iter().map(ToString::to_string).collect();
                println!("redact {} [{}]: {}", event_id, names.join(", "), reasons.join("; "));
            }
        }
        for error in report.errors() {
            warn!(event_id = %event.event_id(), error = %error, "Dispatch error");
        }
    }

    shutdown.cancel();
    sweeper.await?;
    println!("{} events dispatched, {} redacted", dispatched, redacted);
    Ok(())
}
