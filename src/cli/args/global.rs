//! Global CLI options shared across all commands

use devreg::config::Overrides;

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// Precedence is: CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; the config file is merged in
/// `CommandContext`.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Output format (pretty, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.devreg/config.yaml)
    pub config: Option<String>,

    /// Stage, region, endpoint and credential profile overrides
    pub overrides: Overrides,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            overrides: Overrides {
                stage: cli.stage.clone(),
                region: cli.region.clone(),
                endpoint: cli.endpoint.clone(),
                credentials_profile: cli.credentials_profile.clone(),
            },
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }
}
