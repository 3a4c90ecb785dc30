//! Deployment stage and endpoint selection
//!
//! The stage is resolved once per process and turned into an [`Endpoint`]
//! that is handed to the client at construction time. Nothing in the
//! signing or execution path looks the stage up again.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Production API host
pub const HOST_PROD: &str = "profiles.device-registration.example.com";

/// Staging (gamma) API host
pub const HOST_GAMMA: &str = "profiles.gamma.device-registration.example.com";

/// Alpha / test-account API host
pub const HOST_ALPHA: &str = "profiles.alpha.device-registration.example.com";

/// Deployment stage the harness targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Stage {
    Prod,
    Gamma,
    /// Alpha or personal test stages; keeps the name it was given
    Other(String),
}

impl Stage {
    /// Stage name as configured
    pub fn name(&self) -> &str {
        match self {
            Stage::Prod => "prod",
            Stage::Gamma => "gamma",
            Stage::Other(name) => name,
        }
    }

    /// Host for this stage. Pure and time-invariant.
    pub fn host(&self) -> &'static str {
        match self {
            Stage::Prod => HOST_PROD,
            Stage::Gamma => HOST_GAMMA,
            Stage::Other(_) => HOST_ALPHA,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Other("alpha".to_string())
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(ConfigError::InvalidStage(s.to_string()));
        }
        Ok(match name {
            "prod" => Stage::Prod,
            "gamma" => Stage::Gamma,
            other => Stage::Other(other.to_string()),
        })
    }
}

impl TryFrom<String> for Stage {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.name().to_string()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where requests are sent: URL scheme plus `host[:port]`.
///
/// The host doubles as the signed `Host` header, so an override must name
/// the authority the server actually sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
}

impl Endpoint {
    /// HTTPS endpoint for the stage's fixed host
    pub fn for_stage(stage: &Stage) -> Self {
        Self {
            scheme: "https".to_string(),
            host: stage.host().to_string(),
        }
    }

    /// Parse an override such as `http://127.0.0.1:8080`
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidEndpoint {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(invalid("scheme must be http or https"));
        }
        let host = parsed.host_str().ok_or_else(|| invalid("missing host"))?;
        if parsed.path() != "/" && !parsed.path().is_empty() {
            return Err(invalid("endpoint must not carry a path"));
        }

        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            scheme: scheme.to_string(),
            host,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}
