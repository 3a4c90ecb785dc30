//! Credential resolution
//!
//! Credentials come from an ordered list of sources evaluated top-down. Each
//! source either yields a complete credential set or reports that it does not
//! apply, in which case the next source is tried. Resolution happens on every
//! operation; nothing is cached between calls.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::error::{ApiError, Result};

/// Ambient access key id variable
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Ambient secret access key variable
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Ambient session token variable
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
/// Shared credentials file location override
pub const ENV_SHARED_CREDENTIALS_FILE: &str = "AWS_SHARED_CREDENTIALS_FILE";
/// Shared credentials profile override
pub const ENV_PROFILE: &str = "AWS_PROFILE";

const DEFAULT_PROFILE: &str = "default";

/// A resolved credential set. Lives for one operation and is never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }
}

// Secrets stay out of debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// One place credentials may come from
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short name used in logs and `devreg status`
    fn name(&self) -> &'static str;

    /// Load credentials, or `Ok(None)` when this source does not apply
    async fn load(&self) -> Result<Option<Credentials>>;
}

/// Variable lookup used by [`EnvironmentSource`]
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

fn process_env() -> EnvLookup {
    Arc::new(|key| std::env::var(key).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Session credentials injected by the invoking pipeline.
///
/// Applies only when all three variables are present and non-empty.
pub struct EnvironmentSource {
    lookup: EnvLookup,
}

impl EnvironmentSource {
    /// Read from the process environment
    pub fn from_process() -> Self {
        Self {
            lookup: process_env(),
        }
    }

    /// Read from a custom lookup
    pub fn with_lookup(lookup: EnvLookup) -> Self {
        Self { lookup }
    }

    /// Read from a fixed set of variables
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self::with_lookup(Arc::new(move |key| vars.get(key).cloned()))
    }
}

#[async_trait]
impl CredentialSource for EnvironmentSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn load(&self) -> Result<Option<Credentials>> {
        let access_key_id = non_empty((self.lookup)(ENV_ACCESS_KEY_ID));
        let secret_access_key = non_empty((self.lookup)(ENV_SECRET_ACCESS_KEY));
        let session_token = non_empty((self.lookup)(ENV_SESSION_TOKEN));

        match (access_key_id, secret_access_key, session_token) {
            (Some(id), Some(secret), Some(token)) => {
                Ok(Some(Credentials::new(id, secret, Some(token))))
            }
            _ => Ok(None),
        }
    }
}

/// Long-lived or cached credentials from the shared credentials file
/// (`~/.aws/credentials` by default).
pub struct ProfileFileSource {
    path: Option<PathBuf>,
    profile: String,
}

impl ProfileFileSource {
    pub fn new(path: Option<PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            path,
            profile: profile.into(),
        }
    }

    /// Build from explicit settings, falling back to `AWS_SHARED_CREDENTIALS_FILE`,
    /// `AWS_PROFILE` and then the conventional defaults.
    pub fn from_settings(path: Option<PathBuf>, profile: Option<String>) -> Self {
        Self::from_settings_with(path, profile, process_env())
    }

    /// As [`ProfileFileSource::from_settings`] with a custom variable lookup
    pub fn from_settings_with(
        path: Option<PathBuf>,
        profile: Option<String>,
        lookup: EnvLookup,
    ) -> Self {
        let path = path.or_else(|| non_empty(lookup(ENV_SHARED_CREDENTIALS_FILE)).map(PathBuf::from));
        let profile = profile
            .or_else(|| non_empty(lookup(ENV_PROFILE)))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        Self::new(path, profile)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    fn resolve_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".aws").join("credentials")))
    }
}

#[async_trait]
impl CredentialSource for ProfileFileSource {
    fn name(&self) -> &'static str {
        "profile"
    }

    async fn load(&self) -> Result<Option<Credentials>> {
        let Some(path) = self.resolve_path() else {
            return Ok(None);
        };
        if !path.exists() {
            debug!("Credentials file {} not found", path.display());
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let Some(section) = parse_profile(&contents, &self.profile) else {
            debug!(
                "Profile [{}] not present in {}",
                self.profile,
                path.display()
            );
            return Ok(None);
        };

        let access_key_id = non_empty(section.get("aws_access_key_id").cloned());
        let secret_access_key = non_empty(section.get("aws_secret_access_key").cloned());
        let session_token = non_empty(section.get("aws_session_token").cloned());

        match (access_key_id, secret_access_key) {
            (Some(id), Some(secret)) => Ok(Some(Credentials::new(id, secret, session_token))),
            _ => Ok(None),
        }
    }
}

/// Extract one `[profile]` section from an INI-style credentials file.
///
/// Keys are lowercased; `#` and `;` start comment lines.
fn parse_profile(contents: &str, profile: &str) -> Option<HashMap<String, String>> {
    let mut in_section = false;
    let mut found = false;
    let mut values = HashMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = header.trim();
            let name = name.strip_prefix("profile ").unwrap_or(name).trim();
            in_section = name == profile;
            found |= in_section;
            continue;
        }

        if in_section {
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }
    }

    found.then_some(values)
}

/// Ordered list of credential sources
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialChain {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Pipeline session credentials first, then the local profile
    pub fn default_chain(credentials_file: Option<PathBuf>, profile: Option<String>) -> Self {
        Self::new(vec![
            Box::new(EnvironmentSource::from_process()),
            Box::new(ProfileFileSource::from_settings(credentials_file, profile)),
        ])
    }

    /// Resolve credentials, returning the name of the source that supplied them
    pub async fn resolve_with_source(&self) -> Result<(&'static str, Credentials)> {
        for source in &self.sources {
            if let Some(credentials) = source.load().await? {
                debug!("Using credentials from {} source", source.name());
                return Ok((source.name(), credentials));
            }
            debug!("Credential source {} not applicable", source.name());
        }
        Err(ApiError::MissingCredentials.into())
    }

    /// Resolve credentials from the first applicable source
    pub async fn resolve(&self) -> Result<Credentials> {
        self.resolve_with_source().await.map(|(_, creds)| creds)
    }
}
