//! Mock HTTP executor for testing
//!
//! Records every signed request it receives and answers with a canned
//! response, so the client pipeline can be tested without a network.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::executor::{HttpExecutor, HttpResult};
use super::request::SignedRequest;
use crate::error::{ApiError, Result};

/// Mock executor for testing.
///
/// # Example
/// ```ignore
/// let mock = MockExecutor::new().with_response(204, "");
/// let outcome = client_using(mock.clone()).log_out_profile("abc").await?;
/// assert_eq!(mock.captured_requests().await.len(), 1);
/// ```
#[derive(Clone)]
pub struct MockExecutor {
    /// Response returned for every call
    response: HttpResult,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    /// Captured requests for test assertions
    captured_requests: Arc<Mutex<Vec<SignedRequest>>>,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self {
            response: HttpResult {
                status_code: 200,
                headers: BTreeMap::new(),
                body_text: String::new(),
            },
            error: Arc::new(Mutex::new(None)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the status and body returned from execute.
    pub fn with_response(mut self, status_code: u16, body: &str) -> Self {
        self.response.status_code = status_code;
        self.response.body_text = body.to_string();
        self
    }

    /// Configure an error for the next call.
    pub fn with_error(self, error: ApiError) -> Self {
        // Fresh mock, so the lock is uncontended
        if let Ok(mut slot) = self.error.try_lock() {
            *slot = Some(error);
        }
        self
    }

    /// Requests received so far, in call order.
    pub async fn captured_requests(&self) -> Vec<SignedRequest> {
        self.captured_requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.captured_requests.lock().await.len()
    }
}

#[async_trait]
impl HttpExecutor for MockExecutor {
    async fn execute(&self, request: &SignedRequest) -> Result<HttpResult> {
        self.captured_requests.lock().await.push(request.clone());

        if let Some(err) = self.error.lock().await.take() {
            return Err(err.into());
        }
        Ok(self.response.clone())
    }
}
