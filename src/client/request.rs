//! Request descriptors for the device registration API
//!
//! A [`RequestDescriptor`] describes one HTTP request as plain data. The
//! builder produces it with empty headers; the signer returns a new, signed
//! copy that the executor sends unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use serde::Serialize;
use urlencoding::encode;

use crate::error::{ApiError, Result};

/// API Gateway service name used in the signing scope
pub const SERVICE_NAME: &str = "execute-api";

/// Path segment before the profile id
pub const PROFILE_PATH: &str = "/v1/profiles/";

/// Path segment after the profile id
pub const DEVICE_PATH: &str = "/devices";

/// Platform identifier sent on registration
pub const PLATFORM: &str = "ANDROID";

/// Fixed device token used by the harness device
pub const DEVICE_TOKEN: &str = "devreg-harness-device-token";

/// Client-side timeout for both operations
pub const REQUEST_TIMEOUT_MS: u64 = 15_000;

/// HTTP method for a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpMethod {
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations the harness knows how to issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    RegisterDevice,
    LogOutProfile,
}

impl Operation {
    pub fn method(&self) -> HttpMethod {
        match self {
            Operation::RegisterDevice => HttpMethod::Post,
            Operation::LogOutProfile => HttpMethod::Delete,
        }
    }

    /// Status code the API returns on success
    pub fn expected_status(&self) -> u16 {
        match self {
            Operation::RegisterDevice => 200,
            Operation::LogOutProfile => 204,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::RegisterDevice => "registerDevice",
            Operation::LogOutProfile => "logOutProfile",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registration payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RegisterDeviceBody<'a> {
    platform: &'a str,
    device_token: &'a str,
    capabilities: u32,
}

/// Plain-data description of one API request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub host: String,
    pub service: String,
    /// Percent-encoded path as it goes on the wire
    pub path: String,
    pub body: String,
    pub timeout_ms: u64,
    /// Empty until signed
    pub headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    pub fn is_signed(&self) -> bool {
        self.headers.contains_key("Authorization")
    }
}

/// A descriptor that has been through the signer.
///
/// Only the signer constructs one; it derefs to the underlying descriptor
/// for read-only access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest(RequestDescriptor);

impl SignedRequest {
    pub(crate) fn new(descriptor: RequestDescriptor) -> Self {
        Self(descriptor)
    }
}

impl Deref for SignedRequest {
    type Target = RequestDescriptor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Build the descriptor for `operation` against `host`.
///
/// The profile id must be non-empty; its format is the server's concern. It
/// is percent-encoded into the path, which is then sent and signed as-is.
pub fn build(operation: Operation, host: &str, profile_id: &str) -> Result<RequestDescriptor> {
    if profile_id.is_empty() {
        return Err(ApiError::InvalidRequest("profile id must not be empty".to_string()).into());
    }

    let body = match operation {
        Operation::RegisterDevice => serde_json::to_string(&RegisterDeviceBody {
            platform: PLATFORM,
            device_token: DEVICE_TOKEN,
            capabilities: 1,
        })?,
        Operation::LogOutProfile => "{}".to_string(),
    };

    Ok(RequestDescriptor {
        method: operation.method(),
        host: host.to_string(),
        service: SERVICE_NAME.to_string(),
        path: format!("{}{}{}", PROFILE_PATH, encode(profile_id), DEVICE_PATH),
        body,
        timeout_ms: REQUEST_TIMEOUT_MS,
        headers: BTreeMap::new(),
    })
}
