//! Bulwark administrative CLI.
//!
//! Validates protection snapshots, dry-runs dispatch over recorded events and
//! probes remote servers for their registration requirements.

mod cli;

use bulwark::{EngineConfig, LogFormat, ServerRequirementsProtection};
use clap::Parser;
use cli::{Cli, Commands};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loaded = EngineConfig::load(Some(&cli.config));
    init_tracing(
        loaded
            .as_ref()
            .map(|config| *config.log_format())
            .unwrap_or_default(),
    );
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    info!(config_file = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::Validate { protections } => cli::handle_validate_command(&protections),
        Commands::Evaluate {
            protections,
            events,
            power_levels,
        } => {
            cli::handle_evaluate_command(&config, &protections, &events, power_levels.as_deref())
                .await
        }
        Commands::CheckServer {
            server,
            captcha,
            email,
            phone,
            token,
            external_auth,
        } => {
            let requirements = ServerRequirementsProtection::default()
                .with_enabled(true)
                .with_require_captcha(captcha)
                .with_require_email(email)
                .with_require_phone(phone)
                .with_require_registration_token(token)
                .with_require_external_auth(external_auth);
            cli::handle_check_server_command(&config, &server, &requirements).await
        }
    }
}
