//! Command execution context
//!
//! Loads configuration, merges CLI/env overrides, and builds the client, so
//! command handlers start from a ready-to-use state.

use devreg::config::{Config, Settings};
use devreg::error::Result;
use devreg::DeviceRegistrationClient;
use log::debug;

use crate::cli::{GlobalOptions, OutputFormat};

/// Context for command execution
pub struct CommandContext {
    /// Resolved settings (stage, endpoint, region, credential profile)
    pub settings: Settings,
    /// Client wired for the resolved endpoint
    pub client: DeviceRegistrationClient,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// # Errors
    /// Returns error if an explicit config file is missing or invalid, or if
    /// the stage/endpoint overrides do not parse.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let settings = resolve_settings(opts)?;
        let client = DeviceRegistrationClient::from_settings(&settings)?;

        Ok(Self {
            settings,
            client,
            format: opts.format,
        })
    }
}

/// Load the config file and merge overrides on top
pub fn resolve_settings(opts: &GlobalOptions) -> Result<Settings> {
    let config = Config::load_at(opts.config_ref())?;
    let settings = Settings::resolve(&config, &opts.overrides)?;
    debug!(
        "Stage {} -> {} (region {})",
        settings.stage, settings.endpoint, settings.region
    );
    Ok(settings)
}
