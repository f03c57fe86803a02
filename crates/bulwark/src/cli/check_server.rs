//! Capability probe command handler.

use bulwark::{
    EngineConfig, HttpProbeClient, ProtectionState, RequestContext, ServerName,
    ServerRequirementsProtection, SystemClock,
};
use std::sync::Arc;

/// Probes `server` once and prints whether it meets `requirements`.
#[tracing::instrument(skip(config, requirements))]
pub async fn handle_check_server_command(
    config: &EngineConfig,
    server: &str,
    requirements: &ServerRequirementsProtection,
) -> anyhow::Result<()> {
    let probe = Arc::new(HttpProbeClient::new(config.probe_user_agent())?);
    let state = ProtectionState::new(Arc::new(SystemClock::new()), probe.clone(), probe);
    let ctx = RequestContext::new().with_timeout(config.request_timeout());

    let server = ServerName::new(server);
    let verdict = requirements
        .check_server(&ctx, state.server_checker(), &server)
        .await?;
    let summary = requirements.requirements();
    if verdict {
        println!("✓ {} meets requirements ({})", server, summary);
    } else {
        println!("✗ {} does not meet requirements ({})", server, summary);
    }
    Ok(())
}
