//! Library-level tests against a local mock server

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use devreg::client::credentials::{
    ENV_ACCESS_KEY_ID, ENV_SECRET_ACCESS_KEY, ENV_SESSION_TOKEN,
};
use devreg::client::request::{self, DEVICE_PATH, PROFILE_PATH};
use devreg::client::{
    CredentialChain, Credentials, EnvironmentSource, HttpExecutor, Operation, OutcomeKind,
    ReqwestExecutor, RequestSigner,
};
use devreg::{ApiError, DeviceRegistrationClient, Endpoint, Error};
use mockito::Matcher;
use serde_json::json;

fn session_chain() -> CredentialChain {
    let vars: HashMap<String, String> = [
        (ENV_ACCESS_KEY_ID, "AKIATEST"),
        (ENV_SECRET_ACCESS_KEY, "secret"),
        (ENV_SESSION_TOKEN, "session-token"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    CredentialChain::new(vec![Box::new(EnvironmentSource::from_map(vars))])
}

fn client_for(url: &str) -> anyhow::Result<DeviceRegistrationClient> {
    let endpoint = Endpoint::parse(url)?;
    let executor = ReqwestExecutor::new(&endpoint)?;
    Ok(DeviceRegistrationClient::new(
        endpoint,
        session_chain(),
        RequestSigner::new("us-east-1"),
        Arc::new(executor),
    ))
}

fn device_path(profile_id: &str) -> String {
    format!("{PROFILE_PATH}{profile_id}{DEVICE_PATH}")
}

#[tokio::test]
async fn register_device_returns_200_outcome() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", device_path("abc123").as_str())
        .match_header(
            "authorization",
            Matcher::Regex(
                r"^AWS4-HMAC-SHA256 Credential=AKIATEST/\d{8}/us-east-1/execute-api/aws4_request, SignedHeaders=content-type;host;x-amz-date;x-amz-security-token, Signature=[0-9a-f]{64}$"
                    .to_string(),
            ),
        )
        .match_header("x-amz-security-token", "session-token")
        .match_header("x-amz-date", Matcher::Regex(r"^\d{8}T\d{6}Z$".to_string()))
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({ "Capabilities": 1 })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server.url())?;
    let outcome = client.register_device("abc123").await?;

    mock.assert_async().await;
    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert_eq!(outcome.status_code(), 200);
    assert_eq!(outcome.data(), "{}");
    Ok(())
}

#[tokio::test]
async fn log_out_profile_returns_204_outcome() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", device_path("abc123").as_str())
        .match_body("{}")
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server.url())?;
    let outcome = client.log_out_profile("abc123").await?;

    mock.assert_async().await;
    assert!(outcome.is_success());
    assert_eq!(outcome.status_code(), 204);
    assert_eq!(outcome.data(), "");
    Ok(())
}

#[tokio::test]
async fn reserved_characters_in_profile_id_are_encoded_on_the_wire() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/profiles/a%2Bb%3Dc/devices")
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(&server.url())?;
    let outcome = client.register_device("a+b=c").await?;

    mock.assert_async().await;
    assert!(outcome.is_success());
    Ok(())
}

#[tokio::test]
async fn register_device_500_is_returned_not_raised() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", device_path("abc123").as_str())
        .with_status(500)
        .with_header("x-amzn-errortype", "InternalServerErrorException")
        .with_body(r#"{"message":"Internal server error"}"#)
        .create_async()
        .await;

    let client = client_for(&server.url())?;
    let outcome = client.register_device("abc123").await?;

    assert_eq!(
        outcome.kind(),
        OutcomeKind::UnexpectedStatus {
            expected: 200,
            actual: 500
        }
    );
    assert_eq!(outcome.data(), r#"{"message":"Internal server error"}"#);
    assert_eq!(
        outcome.headers().get("x-amzn-errortype").map(String::as_str),
        Some("InternalServerErrorException")
    );
    Ok(())
}

#[tokio::test]
async fn chunked_body_is_fully_drained_in_order() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", device_path("chunky").as_str())
        .with_status(200)
        .with_chunked_body(|w| {
            w.write_all(b"{\"devices\":[")?;
            w.write_all(b"\"first\",")?;
            w.write_all(b"\"second\"")?;
            w.write_all(b"]}")
        })
        .create_async()
        .await;

    let client = client_for(&server.url())?;
    let outcome = client.register_device("chunky").await?;

    assert_eq!(outcome.data(), r#"{"devices":["first","second"]}"#);
    Ok(())
}

fn signed_request(host: &str, timeout_ms: u64) -> anyhow::Result<devreg::client::SignedRequest> {
    let mut descriptor = request::build(Operation::RegisterDevice, host, "abc123")?;
    descriptor.timeout_ms = timeout_ms;
    let creds = Credentials::new("AKIATEST", "secret", None);
    Ok(RequestSigner::new("us-east-1").sign(&descriptor, &creds)?)
}

#[tokio::test]
async fn silent_server_times_out() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    // Accept and hold connections without ever answering
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let endpoint = Endpoint::parse(&format!("http://{}", addr))?;
    let executor = ReqwestExecutor::new(&endpoint)?;
    let request = signed_request(endpoint.host(), 300)?;

    let started = Instant::now();
    let err = executor.execute(&request).await.unwrap_err();
    let elapsed = started.elapsed();

    match err {
        Error::Api(ApiError::RequestTimeout(limit)) => {
            assert_eq!(limit, Duration::from_millis(300))
        }
        other => panic!("Expected RequestTimeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(300), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2300), "returned late: {elapsed:?}");
    Ok(())
}

#[tokio::test]
async fn refused_connection_is_transport_error() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let endpoint = Endpoint::parse(&format!("http://{}", addr))?;
    let executor = ReqwestExecutor::new(&endpoint)?;
    let request = signed_request(endpoint.host(), 5_000)?;

    let err = executor.execute(&request).await.unwrap_err();
    assert!(
        matches!(err, Error::Api(ApiError::Transport(_))),
        "Expected Transport, got {err:?}"
    );
    Ok(())
}
