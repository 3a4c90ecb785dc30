//! Status command implementation

use colored::Colorize;
use devreg::error::{ApiError, Error, Result};
use serde::Serialize;

use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::output::{self, Formattable};

/// What the harness would do, without sending anything
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub stage: String,
    pub endpoint: String,
    pub host: String,
    pub region: String,
    /// Credential source that would be used, if any
    pub credential_source: Option<String>,
    /// Access key id of those credentials (never the secret)
    pub access_key_id: Option<String>,
    pub session_token: bool,
}

impl Formattable for StatusReport {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(output::json::format_json(self)?);
        }

        let mut lines = vec![
            format!("{}\n", "devreg Status".bold()),
            format!("Stage: {}", self.stage.bold()),
            format!("Endpoint: {}", self.endpoint.cyan()),
            format!("Region: {}", self.region),
            String::new(),
        ];

        match (&self.credential_source, &self.access_key_id) {
            (Some(source), Some(key)) => {
                let kind = if self.session_token {
                    "session"
                } else {
                    "long-lived"
                };
                lines.push(format!(
                    "{} Credentials from {} source ({}, {})",
                    "✓".green(),
                    source,
                    key,
                    kind
                ));
            }
            _ => {
                lines.push(format!("{} No usable credentials found", "✗".red()));
                lines.push(
                    "  → Export AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY/AWS_SESSION_TOKEN or refresh ~/.aws/credentials"
                        .to_string(),
                );
            }
        }

        Ok(lines.join("\n"))
    }
}

/// Run the status command
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let (credential_source, access_key_id, session_token) =
        match ctx.client.credentials().resolve_with_source().await {
            Ok((source, creds)) => (
                Some(source.to_string()),
                Some(creds.access_key_id),
                creds.session_token.is_some(),
            ),
            Err(Error::Api(ApiError::MissingCredentials)) => (None, None, false),
            Err(e) => return Err(e),
        };

    let report = StatusReport {
        stage: ctx.settings.stage.to_string(),
        endpoint: ctx.settings.endpoint.to_string(),
        host: ctx.settings.endpoint.host().to_string(),
        region: ctx.settings.region.clone(),
        credential_source,
        access_key_id,
        session_token,
    };

    output::print(&report, ctx.format)
}
