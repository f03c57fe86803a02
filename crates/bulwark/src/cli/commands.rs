//! CLI argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "bulwark")]
#[command(about = "Bulwark - automated protection evaluation for moderation bots")]
#[command(version)]
pub struct Cli {
    /// Path to the engine configuration file
    #[arg(short, long, env = "BULWARK_CONFIG", default_value = "bulwark.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a protections snapshot and report what it configures
    Validate {
        /// Path to the protections JSON
        protections: PathBuf,
    },

    /// Dry-run dispatch over recorded events, logging would-be redactions
    Evaluate {
        /// Path to the protections JSON
        #[arg(long)]
        protections: PathBuf,

        /// Path to events, one JSON event per line
        #[arg(long)]
        events: PathBuf,

        /// Path to power levels, a JSON object keyed by room ID
        #[arg(long)]
        power_levels: Option<PathBuf>,
    },

    /// Probe a server's registration requirements
    CheckServer {
        /// Server name, e.g. example.org
        server: String,

        /// Require a CAPTCHA stage
        #[arg(long)]
        captcha: bool,

        /// Require email verification
        #[arg(long)]
        email: bool,

        /// Require phone verification
        #[arg(long)]
        phone: bool,

        /// Require a registration token
        #[arg(long)]
        token: bool,

        /// Require external authentication
        #[arg(long)]
        external_auth: bool,
    },
}
