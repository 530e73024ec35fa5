//! Single entry point for model calls.
//!
//! Every feature (chat turns, profile synthesis, task extraction,
//! decision simulation, translation, media, live audio) goes through
//! [`AiGateway`]. The gateway routes a request to a model tier, runs it
//! under the retry policy, and falls back to the configured tier once
//! when the primary is exhausted by transient errors.

pub mod policy;
pub mod provider;

use serde::de::DeserializeOwned;
use tracing::Instrument;

use doppel_types::config::ModelCatalog;
use doppel_types::error::GatewayError;
use doppel_types::gateway::{
    ChatTurn, GenerateInput, GenerateRequest, GenerateResponse, MediaJobHandle, MediaJobParams,
    MediaJobStatus, ModelTier, RetryPolicy,
};
use doppel_types::live::LiveConfig;

pub use provider::{
    LiveCommand, LiveHandle, LiveProvider, MediaProvider, ResolvedRequest, TextProvider,
};

use policy::run_with_retry;

/// Routes generation requests to a provider with retry and tier fallback.
pub struct AiGateway<P> {
    provider: P,
    catalog: ModelCatalog,
    policy: RetryPolicy,
}

impl<P> AiGateway<P> {
    pub fn new(provider: P, catalog: ModelCatalog, policy: RetryPolicy) -> Self {
        Self {
            provider,
            catalog,
            policy,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }
}

impl<P: TextProvider> AiGateway<P> {
    /// Generate a response for `request`.
    ///
    /// The primary tier comes from [`GenerateRequest::primary_tier`].
    /// Transient failures are retried per the policy; once attempts are
    /// exhausted, a configured fallback tier gets exactly one more try.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GatewayError> {
        let primary = request.primary_tier();
        let resolved = self.resolve(request, primary);
        let span = tracing::info_span!(
            "gen_ai.generate",
            gen_ai.operation.name = "generate",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %resolved.model,
        );

        async {
            let result = run_with_retry(&self.policy, |_| self.provider.generate(&resolved)).await;
            match result {
                Ok(response) => Ok(response),
                Err(err) if err.is_transient() => match request.fallback_tier {
                    Some(fallback) if fallback != primary => {
                        let fallback_resolved = self.resolve(request, fallback);
                        tracing::warn!(
                            primary_model = %resolved.model,
                            fallback_model = %fallback_resolved.model,
                            error = %err,
                            "Primary tier exhausted, trying fallback tier once"
                        );
                        self.provider.generate(&fallback_resolved).await
                    }
                    _ => Err(err),
                },
                Err(err) => Err(err),
            }
        }
        .instrument(span)
        .await
    }

    /// Generate and deserialize a structured (JSON schema) response.
    ///
    /// The request should carry a `response_schema`; a reply that fails
    /// to deserialize into `T` is a [`GatewayError::Shape`].
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        request: &GenerateRequest,
    ) -> Result<T, GatewayError> {
        let response = self.generate(request).await?;
        serde_json::from_str(response.text.trim())
            .map_err(|e| GatewayError::Shape(format!("failed to parse model response: {e}")))
    }

    /// Resolve a request against the model catalog for `tier`.
    fn resolve(&self, request: &GenerateRequest, tier: ModelTier) -> ResolvedRequest {
        let turns = match &request.input {
            GenerateInput::Prompt(text) => vec![ChatTurn::user(text.clone())],
            GenerateInput::Chat { history, message } => {
                let mut turns = history.clone();
                turns.push(message.clone());
                turns
            }
        };
        ResolvedRequest {
            model: self.catalog.model_for(tier).to_string(),
            turns,
            system: request.system.clone(),
            reasoning_budget: request.reasoning_budget,
            grounding: request.grounding,
            response_schema: request.response_schema.clone(),
            temperature: request.temperature,
        }
    }
}

impl<P: LiveProvider> AiGateway<P> {
    /// Open a live audio session. Pure passthrough to the provider.
    pub async fn open_live(&self, config: LiveConfig) -> Result<LiveHandle, GatewayError> {
        self.provider.open_live(config).await
    }
}

impl<P: MediaProvider> AiGateway<P> {
    /// Start a media generation job.
    pub async fn start_media_job(
        &self,
        params: &MediaJobParams,
    ) -> Result<MediaJobHandle, GatewayError> {
        self.provider.start_job(params).await
    }

    /// Poll a media generation job.
    pub async fn poll_media_job(
        &self,
        handle: &MediaJobHandle,
    ) -> Result<MediaJobStatus, GatewayError> {
        self.provider.poll_job(handle).await
    }
}
