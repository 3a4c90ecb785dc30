//! Device registration client
//!
//! Runs the resolve, build, sign, execute pipeline for the two supported
//! operations. Each call builds its own descriptor and result, so concurrent
//! calls share nothing but the read-only endpoint and signer settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use super::credentials::CredentialChain;
use super::executor::{HttpExecutor, HttpResult, ReqwestExecutor};
use super::request::{self, Operation};
use super::signer::RequestSigner;
use crate::config::{Endpoint, Settings};
use crate::error::{ApiError, Result};

/// How an operation's response compares to the status it expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    UnexpectedStatus { expected: u16, actual: u16 },
}

/// Result of one operation, returned whatever the status code.
///
/// Serializes as `{operation, success, data, response: {statusCode, headers}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    operation: Operation,
    result: HttpResult,
}

/// Outcome of `register_device`
pub type RegistrationOutcome = Outcome;

/// Outcome of `log_out_profile`
pub type LogoutOutcome = Outcome;

impl Outcome {
    pub fn new(operation: Operation, result: HttpResult) -> Self {
        Self { operation, result }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn status_code(&self) -> u16 {
        self.result.status_code
    }

    /// Raw response body
    pub fn data(&self) -> &str {
        &self.result.body_text
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.result.headers
    }

    pub fn kind(&self) -> OutcomeKind {
        let expected = self.operation.expected_status();
        if self.result.status_code == expected {
            OutcomeKind::Success
        } else {
            OutcomeKind::UnexpectedStatus {
                expected,
                actual: self.result.status_code,
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind() == OutcomeKind::Success
    }

    /// Turn an unexpected status into an error, for callers that want one
    pub fn ensure_success(self) -> Result<Self> {
        match self.kind() {
            OutcomeKind::Success => Ok(self),
            OutcomeKind::UnexpectedStatus { expected, actual } => {
                Err(ApiError::UnexpectedStatus {
                    expected,
                    actual,
                    body: self.result.body_text,
                }
                .into())
            }
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Response<'a> {
            status_code: u16,
            headers: &'a BTreeMap<String, String>,
        }

        #[derive(Serialize)]
        struct View<'a> {
            operation: Operation,
            success: bool,
            data: &'a str,
            response: Response<'a>,
        }

        View {
            operation: self.operation,
            success: self.is_success(),
            data: self.data(),
            response: Response {
                status_code: self.status_code(),
                headers: self.headers(),
            },
        }
        .serialize(serializer)
    }
}

/// Client for the device registration API
pub struct DeviceRegistrationClient {
    endpoint: Endpoint,
    credentials: CredentialChain,
    signer: RequestSigner,
    executor: Arc<dyn HttpExecutor>,
}

impl DeviceRegistrationClient {
    /// Assemble a client from explicit parts
    pub fn new(
        endpoint: Endpoint,
        credentials: CredentialChain,
        signer: RequestSigner,
        executor: Arc<dyn HttpExecutor>,
    ) -> Self {
        Self {
            endpoint,
            credentials,
            signer,
            executor,
        }
    }

    /// Production wiring: default credential chain and a reqwest executor
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let executor = ReqwestExecutor::new(&settings.endpoint)?;
        Ok(Self::new(
            settings.endpoint.clone(),
            CredentialChain::default_chain(
                settings.credentials_file.clone(),
                settings.credentials_profile.clone(),
            ),
            RequestSigner::new(settings.region.clone()),
            Arc::new(executor),
        ))
    }

    pub fn credentials(&self) -> &CredentialChain {
        &self.credentials
    }

    /// Register the harness device against a profile. Expects 200.
    pub async fn register_device(&self, profile_id: &str) -> Result<RegistrationOutcome> {
        self.run(Operation::RegisterDevice, profile_id).await
    }

    /// Log a profile out. Expects 204.
    pub async fn log_out_profile(&self, profile_id: &str) -> Result<LogoutOutcome> {
        self.run(Operation::LogOutProfile, profile_id).await
    }

    async fn run(&self, operation: Operation, profile_id: &str) -> Result<Outcome> {
        let credentials = self.credentials.resolve().await?;
        let descriptor = request::build(operation, self.endpoint.host(), profile_id)?;
        debug!(
            "{}: {} {}",
            operation, descriptor.method, descriptor.path
        );
        let signed = self.signer.sign(&descriptor, &credentials)?;
        let result = self.executor.execute(&signed).await?;

        let outcome = Outcome::new(operation, result);
        match outcome.kind() {
            OutcomeKind::Success => info!("{} finished successfully", operation),
            OutcomeKind::UnexpectedStatus { expected, actual } => warn!(
                "{} failed with status {} (expected {}): {}",
                operation,
                actual,
                expected,
                outcome.data()
            ),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::credentials::{
        CredentialSource, Credentials, ENV_ACCESS_KEY_ID, ENV_SECRET_ACCESS_KEY,
        ENV_SESSION_TOKEN, EnvironmentSource,
    };
    use crate::client::mock::MockExecutor;
    use crate::client::request::{DEVICE_PATH, HttpMethod, PROFILE_PATH};
    use crate::client::signer::{HEADER_AUTHORIZATION, HEADER_SECURITY_TOKEN};
    use crate::config::{HOST_PROD, Stage};
    use crate::error::Error;

    fn session_env() -> Box<dyn CredentialSource> {
        Box::new(EnvironmentSource::from_map(
            [
                (ENV_ACCESS_KEY_ID, "AKIATEST"),
                (ENV_SECRET_ACCESS_KEY, "secret"),
                (ENV_SESSION_TOKEN, "token"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ))
    }

    fn client_with(stage: Stage, mock: &MockExecutor) -> DeviceRegistrationClient {
        DeviceRegistrationClient::new(
            Endpoint::for_stage(&stage),
            CredentialChain::new(vec![session_env()]),
            RequestSigner::new("us-east-1"),
            Arc::new(mock.clone()),
        )
    }

    #[tokio::test]
    async fn test_register_device_prod_request_shape() {
        let mock = MockExecutor::new().with_response(200, "{}");
        let client = client_with(Stage::Prod, &mock);

        let outcome = client.register_device("abc123").await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.status_code(), 200);
        assert_eq!(outcome.data(), "{}");

        let requests = mock.captured_requests().await;
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.host, HOST_PROD);
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.path, format!("{PROFILE_PATH}abc123{DEVICE_PATH}"));
        assert!(sent.headers.contains_key(HEADER_AUTHORIZATION));
        assert_eq!(sent.headers[HEADER_SECURITY_TOKEN], "token");

        let body: serde_json::Value = serde_json::from_str(&sent.body).unwrap();
        assert_eq!(body["Capabilities"], 1);
    }

    #[tokio::test]
    async fn test_log_out_profile_success() {
        let mock = MockExecutor::new().with_response(204, "");
        let client = client_with(Stage::Gamma, &mock);

        let outcome = client.log_out_profile("abc123").await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::Success);
        assert_eq!(outcome.operation(), Operation::LogOutProfile);

        let requests = mock.captured_requests().await;
        assert_eq!(requests[0].method, HttpMethod::Delete);
        assert_eq!(requests[0].body, "{}");
        assert_eq!(requests[0].host, Stage::Gamma.host());
    }

    #[tokio::test]
    async fn test_unexpected_status_is_not_an_error() {
        let mock = MockExecutor::new().with_response(500, "internal failure");
        let client = client_with(Stage::Prod, &mock);

        let outcome = client.register_device("abc123").await.unwrap();
        assert_eq!(
            outcome.kind(),
            OutcomeKind::UnexpectedStatus {
                expected: 200,
                actual: 500
            }
        );
        assert_eq!(outcome.data(), "internal failure");

        let err = outcome.ensure_success().unwrap_err();
        match err {
            Error::Api(ApiError::UnexpectedStatus { actual, body, .. }) => {
                assert_eq!(actual, 500);
                assert_eq!(body, "internal failure");
            }
            other => panic!("Expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_logout_200_is_unexpected() {
        let mock = MockExecutor::new().with_response(200, "");
        let client = client_with(Stage::Prod, &mock);

        let outcome = client.log_out_profile("abc123").await.unwrap();
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_missing_credentials_aborts_before_request() {
        let mock = MockExecutor::new().with_response(200, "{}");
        let client = DeviceRegistrationClient::new(
            Endpoint::for_stage(&Stage::Prod),
            CredentialChain::new(vec![Box::new(EnvironmentSource::from_map(
                Default::default(),
            ))]),
            RequestSigner::new("us-east-1"),
            Arc::new(mock.clone()),
        );

        let err = client.register_device("abc123").await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::MissingCredentials)));
        assert_eq!(mock.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mock = MockExecutor::new().with_error(ApiError::Transport("reset".to_string()));
        let client = client_with(Stage::Prod, &mock);

        let err = client.log_out_profile("abc123").await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn test_credentials_resolved_per_call() {
        struct Counting(Arc<std::sync::atomic::AtomicUsize>);

        #[async_trait::async_trait]
        impl CredentialSource for Counting {
            fn name(&self) -> &'static str {
                "counting"
            }

            async fn load(&self) -> Result<Option<Credentials>> {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(Some(Credentials::new("AKIA", "secret", None)))
            }
        }

        let loads = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mock = MockExecutor::new().with_response(200, "{}");
        let client = DeviceRegistrationClient::new(
            Endpoint::for_stage(&Stage::Prod),
            CredentialChain::new(vec![Box::new(Counting(loads.clone()))]),
            RequestSigner::new("us-east-1"),
            Arc::new(mock.clone()),
        );

        client.register_device("a").await.unwrap();
        client.register_device("b").await.unwrap();
        assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_operations_are_independent() {
        let mock = MockExecutor::new().with_response(200, "{}");
        let client = client_with(Stage::Prod, &mock);

        let (a, b) = tokio::join!(client.register_device("one"), client.register_device("two"));
        assert!(a.unwrap().is_success());
        assert!(b.unwrap().is_success());

        let mut paths: Vec<_> = mock
            .captured_requests()
            .await
            .into_iter()
            .map(|r| r.path.clone())
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                format!("{PROFILE_PATH}one{DEVICE_PATH}"),
                format!("{PROFILE_PATH}two{DEVICE_PATH}"),
            ]
        );
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = Outcome::new(
            Operation::RegisterDevice,
            HttpResult {
                status_code: 200,
                headers: BTreeMap::from([("x-amzn-requestid".to_string(), "r-1".to_string())]),
                body_text: "{}".to_string(),
            },
        );

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["operation"], "registerDevice");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "{}");
        assert_eq!(json["response"]["statusCode"], 200);
        assert_eq!(json["response"]["headers"]["x-amzn-requestid"], "r-1");
    }
}
