//! Error types shared across Doppel crates.
//!
//! The taxonomy follows the call path: `GatewayError` for anything the AI
//! gateway surfaces (configuration, transient, permanent, shape),
//! `StoreError` for key-value persistence, and per-engine enums layered on
//! top of those.

use thiserror::Error;

use crate::live::LivePhase;

/// Errors surfaced by the AI gateway and its providers.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required credential is absent. Fatal to the attempted operation;
    /// never retried.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// The provider rate-limited the request. Transient.
    #[error("rate limited by provider")]
    RateLimited {
        /// Suggested wait before retrying, if the provider supplied one.
        retry_after_ms: Option<u64>,
    },

    /// The provider is temporarily unavailable or overloaded. Transient.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The API key was rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The request was malformed or rejected by request validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other provider-side failure.
    #[error("provider error: {message}")]
    Provider { message: String },

    /// Structured output did not parse against the declared schema.
    #[error("structured output failed validation: {0}")]
    Shape(String),
}

impl GatewayError {
    /// Whether this error should be retried with backoff (and routed to a
    /// fallback tier once retries exhaust).
    ///
    /// Only rate limiting and service unavailability qualify. Auth
    /// failures, invalid requests, and shape errors will fail the same way
    /// on every attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited { .. } | GatewayError::Unavailable(_)
        )
    }
}

/// Errors from the key-value persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A value failed to serialize or deserialize.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from session lookup and lifecycle operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(uuid::Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the conversational turn engine.
///
/// Gateway failures during a send are NOT here: those are folded into
/// the session log as a model-authored message so the conversation
/// stays usable. Only failures that prevent the turn from running at
/// all surface as errors.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The log has no message a regenerate could act on.
    #[error("nothing to regenerate")]
    NothingToRegenerate,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors from decision simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the live audio engine.
#[derive(Debug, Error)]
pub enum LiveError {
    /// A phase transition not permitted by the live state machine.
    #[error("illegal live phase transition: {from} -> {to}")]
    IllegalTransition { from: LivePhase, to: LivePhase },

    /// The live channel closed before the session was asked to end.
    #[error("live channel closed unexpectedly")]
    ChannelClosed,

    /// The live stream reported a failure.
    #[error("live stream failed: {0}")]
    Stream(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from long-running media generation.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The poll loop exceeded its wall-clock deadline.
    #[error("media job timed out after {0}s")]
    Timeout(u64),

    /// The job finished without producing an artifact.
    #[error("media job failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(
            GatewayError::RateLimited {
                retry_after_ms: Some(500)
            }
            .is_transient()
        );
        assert!(GatewayError::Unavailable("overloaded".to_string()).is_transient());

        assert!(!GatewayError::AuthenticationFailed.is_transient());
        assert!(!GatewayError::InvalidRequest("bad".to_string()).is_transient());
        assert!(!GatewayError::MissingCredential("GEMINI_API_KEY".to_string()).is_transient());
        assert!(!GatewayError::Shape("no json".to_string()).is_transient());
        assert!(
            !GatewayError::Provider {
                message: "boom".to_string()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::MissingCredential("GEMINI_API_KEY".to_string());
        assert_eq!(err.to_string(), "missing credential: GEMINI_API_KEY");

        let err = LiveError::IllegalTransition {
            from: LivePhase::Idle,
            to: LivePhase::Interrupted,
        };
        assert_eq!(
            err.to_string(),
            "illegal live phase transition: idle -> interrupted"
        );

        let err = MediaError::Timeout(600);
        assert_eq!(err.to_string(), "media job timed out after 600s");
    }

    #[test]
    fn test_store_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(err.to_string().starts_with("serialization failed"));
    }
}
