//! AWS Signature Version 4 request signing
//!
//! Signs a [`RequestDescriptor`] for an API Gateway endpoint. The signer is
//! pure apart from reading the wall clock in [`RequestSigner::sign`]; use
//! [`RequestSigner::sign_at`] to pin the timestamp.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::debug;
use sha2::{Digest, Sha256};
use urlencoding::encode;

use super::credentials::Credentials;
use super::request::{RequestDescriptor, SignedRequest};
use crate::error::{ApiError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Header names written by the signer
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_AMZ_DATE: &str = "X-Amz-Date";
pub const HEADER_SECURITY_TOKEN: &str = "X-Amz-Security-Token";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_HOST: &str = "Host";

const CONTENT_TYPE_JSON: &str = "application/json";

/// Signs descriptors for one region
#[derive(Debug, Clone)]
pub struct RequestSigner {
    region: String,
}

impl RequestSigner {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    /// Sign with the current wall-clock time
    pub fn sign(
        &self,
        descriptor: &RequestDescriptor,
        credentials: &Credentials,
    ) -> Result<SignedRequest> {
        self.sign_at(descriptor, credentials, Utc::now())
    }

    /// Sign at a fixed instant. Returns a new descriptor carrying the
    /// signature headers; the input is left untouched.
    pub fn sign_at(
        &self,
        descriptor: &RequestDescriptor,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        validate(descriptor, credentials, &self.region)?;

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        // Canonical (lowercase) names to values
        let mut canonical = BTreeMap::new();
        canonical.insert("content-type".to_string(), CONTENT_TYPE_JSON.to_string());
        canonical.insert("host".to_string(), descriptor.host.clone());
        canonical.insert("x-amz-date".to_string(), amz_date.clone());
        if let Some(token) = &credentials.session_token {
            canonical.insert("x-amz-security-token".to_string(), token.clone());
        }

        let request = CanonicalRequest {
            method: descriptor.method.as_str(),
            path: &descriptor.path,
            headers: &canonical,
            body: &descriptor.body,
        };
        let scope = format!(
            "{}/{}/{}/aws4_request",
            date, self.region, descriptor.service
        );
        let string_to_sign = string_to_sign(&amz_date, &scope, &request.to_string_form());
        let key = signing_key(
            &credentials.secret_access_key,
            &date,
            &self.region,
            &descriptor.service,
        )?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            credentials.access_key_id,
            scope,
            request.signed_headers(),
            signature
        );

        let mut signed = descriptor.clone();
        signed
            .headers
            .insert(HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string());
        signed
            .headers
            .insert(HEADER_HOST.to_string(), descriptor.host.clone());
        signed.headers.insert(HEADER_AMZ_DATE.to_string(), amz_date);
        if let Some(token) = &credentials.session_token {
            signed
                .headers
                .insert(HEADER_SECURITY_TOKEN.to_string(), token.clone());
        }
        signed
            .headers
            .insert(HEADER_AUTHORIZATION.to_string(), authorization);

        debug!(
            "Signed {} {} for scope {}",
            descriptor.method, descriptor.path, scope
        );
        Ok(SignedRequest::new(signed))
    }
}

fn validate(descriptor: &RequestDescriptor, credentials: &Credentials, region: &str) -> Result<()> {
    let missing = |what: &str| -> Result<()> {
        Err(ApiError::Signing(format!("{} must not be empty", what)).into())
    };

    if credentials.access_key_id.trim().is_empty() {
        return missing("access key id");
    }
    if credentials.secret_access_key.is_empty() {
        return missing("secret access key");
    }
    if descriptor.host.is_empty() {
        return missing("host");
    }
    if descriptor.service.is_empty() {
        return missing("service");
    }
    if region.is_empty() {
        return missing("region");
    }
    if !descriptor.path.starts_with('/') {
        return Err(ApiError::Signing(format!(
            "path must be absolute, got {:?}",
            descriptor.path
        ))
        .into());
    }
    if !is_wire_path(&descriptor.path) {
        return Err(ApiError::Signing(format!(
            "path must be percent-encoded, got {:?}",
            descriptor.path
        ))
        .into());
    }
    Ok(())
}

/// Canonical form of a request as defined by SigV4
struct CanonicalRequest<'a> {
    method: &'a str,
    path: &'a str,
    /// Lowercase header names, kept sorted by the map
    headers: &'a BTreeMap<String, String>,
    body: &'a str,
}

impl CanonicalRequest<'_> {
    fn signed_headers(&self) -> String {
        self.headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }

    fn to_string_form(&self) -> String {
        let canonical_headers: String = self
            .headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();

        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            canonical_uri(self.path),
            "", // no query string
            canonical_headers,
            self.signed_headers(),
            hex_sha256(self.body.as_bytes())
        )
    }
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex_sha256(canonical_request.as_bytes())
    )
}

/// kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")
fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ApiError::Signing(format!("invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// The descriptor path is already encoded once (it is what goes on the
/// wire); non-S3 services sign each segment encoded a second time.
fn canonical_uri(path: &str) -> String {
    path.split('/')
        .map(|segment| encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Only unreserved characters, `/` and `%XX` escapes may appear in a wire path
fn is_wire_path(path: &str) -> bool {
    path.bytes().all(|b| {
        b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b'/' | b'%')
    })
}
