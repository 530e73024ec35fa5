//! Shared test doubles for the engine test suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use doppel_types::error::GatewayError;
use doppel_types::gateway::{GenerateResponse, RetryPolicy};

use crate::gateway::provider::{ResolvedRequest, TextProvider};

/// Retry policy with millisecond delays so tests do not sleep.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

/// A scripted [`TextProvider`]: responses are served in push order, and
/// every resolved request is recorded for assertions.
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<GenerateResponse, GatewayError>>>,
    requests: Mutex<Vec<ResolvedRequest>>,
    calls: AtomicU32,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    pub async fn push_text(&self, text: &str) {
        self.responses
            .lock()
            .await
            .push_back(Ok(GenerateResponse::text_only(text)));
    }

    pub async fn push_response(&self, response: GenerateResponse) {
        self.responses.lock().await.push_back(Ok(response));
    }

    pub async fn push_err(&self, err: GatewayError) {
        self.responses.lock().await.push_back(Err(err));
    }

    pub async fn requests(&self) -> Vec<ResolvedRequest> {
        self.requests.lock().await.clone()
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &ResolvedRequest) -> Result<GenerateResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());
        match self.responses.lock().await.pop_front() {
            Some(result) => result,
            None => Err(GatewayError::Provider {
                message: "mock provider has no scripted response".into(),
            }),
        }
    }
}
