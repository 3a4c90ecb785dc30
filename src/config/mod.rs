//! Configuration management for devreg

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

pub mod stage;

pub use stage::{Endpoint, HOST_ALPHA, HOST_GAMMA, HOST_PROD, Stage};

/// Region used for signing when nothing else is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Harness configuration file (`~/.devreg/config.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Deployment stage (prod, gamma, anything else targets alpha)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    /// Signing region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Endpoint URL override for local simulation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Named profile in the shared credentials file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_profile: Option<String>,

    /// Shared credentials file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".devreg").join("config.yaml"))
    }

    /// Load configuration from an explicit path, or the default location.
    ///
    /// A missing default file is not an error; the harness runs on flags and
    /// environment alone. A missing explicit file is.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(PathBuf::from(p)),
            None => {
                let default = Self::default_path()?;
                if default.exists() {
                    Self::load_from(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }
}

/// Fully resolved settings used to construct a client.
///
/// Precedence is flag > environment > config file > default; the first two
/// layers arrive already merged by clap.
#[derive(Debug, Clone)]
pub struct Settings {
    pub stage: Stage,
    pub endpoint: Endpoint,
    pub region: String,
    pub credentials_profile: Option<String>,
    pub credentials_file: Option<PathBuf>,
}

/// Values supplied on the command line or via `DEVREG_*` variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub stage: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub credentials_profile: Option<String>,
}

impl Settings {
    /// Merge overrides on top of a loaded config file
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Self> {
        let stage = match overrides.stage.as_deref() {
            Some(name) => name.parse::<Stage>()?,
            None => config.stage.clone().unwrap_or_default(),
        };

        let endpoint = match overrides
            .endpoint
            .as_deref()
            .or(config.endpoint.as_deref())
        {
            Some(url) => Endpoint::parse(url)?,
            None => Endpoint::for_stage(&stage),
        };

        let region = overrides
            .region
            .clone()
            .or_else(|| config.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        if region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".to_string()).into());
        }

        Ok(Self {
            stage,
            endpoint,
            region,
            credentials_profile: overrides
                .credentials_profile
                .clone()
                .or_else(|| config.credentials_profile.clone()),
            credentials_file: config.credentials_file.clone(),
        })
    }
}
