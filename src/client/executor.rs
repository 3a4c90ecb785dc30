//! HTTP execution of signed requests

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::Serialize;

use super::request::SignedRequest;
use crate::config::Endpoint;
use crate::error::{ApiError, Result};

/// Completed response: status, headers, and the fully drained body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResult {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body_text: String,
}

/// Sends a signed request and returns the completed response
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Execute exactly once. Resolves only after the response body ends.
    async fn execute(&self, request: &SignedRequest) -> Result<HttpResult>;
}

/// reqwest-backed executor
pub struct ReqwestExecutor {
    http: HttpClient,
    scheme: String,
}

impl ReqwestExecutor {
    /// Create an executor speaking the endpoint's scheme
    pub fn new(endpoint: &Endpoint) -> Result<Self> {
        // No client-wide timeout: each request carries its own
        let http = HttpClient::builder()
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            scheme: endpoint.scheme().to_string(),
        })
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: &SignedRequest) -> Result<HttpResult> {
        // The path is already percent-encoded; the URL parser keeps escapes intact
        let url = format!("{}://{}{}", self.scheme, request.host, request.path);
        let to_api_error = |e: reqwest::Error| {
            if e.is_timeout() {
                ApiError::timeout_ms(request.timeout_ms)
            } else {
                ApiError::from(e)
            }
        };

        let mut builder = self
            .http
            .request(request.method.into(), &url)
            .timeout(Duration::from_millis(request.timeout_ms))
            .body(request.body.clone());
        for (name, value) in &request.headers {
            // reqwest derives Host from the URL, which carries the same authority
            if name.eq_ignore_ascii_case("host") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!("{} {}", request.method, url);

        // The request timeout covers connect, headers and the full body; on
        // expiry the future is dropped and the connection with it.
        let mut response = builder.send().await.map_err(to_api_error)?;
        let status_code = response.status().as_u16();

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        // Chunks are appended in arrival order; decode once the stream ends
        // so multi-byte characters split across chunks survive.
        let mut body = Vec::new();
        let mut chunks = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(to_api_error)? {
            chunks += 1;
            body.extend_from_slice(&chunk);
        }

        debug!(
            "{} {} -> {} ({} bytes in {} chunks)",
            request.method,
            request.path,
            status_code,
            body.len(),
            chunks
        );

        Ok(HttpResult {
            status_code,
            headers,
            body_text: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
