//! Retry execution for transient gateway failures.
//!
//! One executor owns the retry loop so every call site shares the same
//! classification and backoff behavior. Transient errors (rate limited,
//! overloaded) are retried with exponential backoff; auth, request, and
//! provider errors are returned immediately.

use std::future::Future;

use doppel_types::error::GatewayError;
use doppel_types::gateway::RetryPolicy;

/// Run `operation` under `policy`, retrying transient failures.
///
/// The closure receives the zero-based attempt number. Backoff sleeps
/// between attempts according to [`RetryPolicy::delay_for`]; when the
/// provider supplied a `Retry-After` hint it wins over the computed
/// delay.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, GatewayError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < policy.max_attempts => {
                let delay = match &err {
                    GatewayError::RateLimited {
                        retry_after_ms: Some(ms),
                    } => std::time::Duration::from_millis(*ms).min(policy.max_delay),
                    _ => policy.delay_for(attempt),
                };
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient gateway error, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
