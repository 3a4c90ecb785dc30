//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod args;
pub mod context;
pub mod device;
pub mod status;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// devreg - drive the device registration API with signed requests
#[derive(Parser, Debug)]
#[command(name = "devreg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, json)
    #[arg(
        long,
        global = true,
        env = "DEVREG_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Deployment stage (prod, gamma; anything else targets alpha)
    #[arg(long, global = true, env = "DEVREG_STAGE", hide_env = true)]
    pub stage: Option<String>,

    /// Signing region
    #[arg(long, global = true, env = "DEVREG_REGION", hide_env = true)]
    pub region: Option<String>,

    /// Endpoint URL override, e.g. http://127.0.0.1:8080
    #[arg(long, global = true, env = "DEVREG_ENDPOINT", hide_env = true)]
    pub endpoint: Option<String>,

    /// Override config file location
    #[arg(long, global = true, env = "DEVREG_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Profile to read from the shared credentials file
    #[arg(long, global = true, env = "DEVREG_CREDENTIALS_PROFILE", hide_env = true)]
    pub credentials_profile: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "DEVREG_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register the harness device for a profile (expects 200)
    Register {
        /// Profile identifier
        profile_id: String,
    },

    /// Log a profile out (expects 204)
    Logout {
        /// Profile identifier
        profile_id: String,
    },

    /// Show resolved stage, target host, and credential source
    Status,

    /// Display version information
    Version,
}
