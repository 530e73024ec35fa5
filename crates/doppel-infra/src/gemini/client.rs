//! GeminiProvider -- concrete [`TextProvider`] and [`MediaProvider`] for the
//! Google Generative Language API.
//!
//! Sends requests to `models/{model}:generateContent` with `x-goog-api-key`
//! authentication. Media jobs run as inline image generation (done on the
//! first poll) or `:predictLongRunning` video operations polled by name.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use doppel_core::gateway::{MediaProvider, ResolvedRequest, TextProvider};
use doppel_types::config::ModelCatalog;
use doppel_types::error::GatewayError;
use doppel_types::gateway::{
    Citation, GenerateResponse, MediaJobHandle, MediaJobParams, MediaJobStatus, TurnRole,
};
use doppel_types::twin::MediaKind;

use super::types::{
    ApiErrorBody, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GoogleSearch, Operation, Part, PredictLongRunningRequest, ThinkingConfig, Tool, VideoInstance,
};

/// Gemini API provider.
///
/// Implements [`TextProvider`] for chat/prompt generation and
/// [`MediaProvider`] for image and video jobs. The live WebSocket
/// binding is in [`super::live`].
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers. It never appears in Debug output,
/// Display output, or tracing logs.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    ws_base_url: String,
    catalog: ModelCatalog,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    ///
    /// The catalog supplies the image and video model ids; text requests
    /// arrive already resolved to a concrete model by the gateway.
    pub fn new(api_key: SecretString, catalog: ModelCatalog) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min timeout for long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            ws_base_url: "wss://generativelanguage.googleapis.com/ws".to_string(),
            catalog,
        }
    }

    /// Override the base URL (useful for testing or proxies).
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub(crate) fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub(crate) fn ws_base_url(&self) -> &str {
        &self.ws_base_url
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Convert a resolved gateway request into the wire request.
    fn to_generate_request(request: &ResolvedRequest) -> GenerateContentRequest {
        let contents = request
            .turns
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Model => "model",
                };
                let mut parts = vec![Part::text(&turn.text)];
                if let Some(attachment) = &turn.attachment {
                    parts.push(Part::inline_data(&attachment.mime_type, &attachment.data));
                }
                Content {
                    role: Some(role.to_string()),
                    parts,
                }
            })
            .collect();

        let tools = request.grounding.then(|| {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        });

        let wants_config = request.temperature.is_some()
            || request.reasoning_budget.is_some()
            || request.response_schema.is_some();
        let generation_config = wants_config.then(|| GenerationConfig {
            temperature: request.temperature,
            response_mime_type: request
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema: request.response_schema.as_ref().map(|s| s.schema.clone()),
            thinking_config: request
                .reasoning_budget
                .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            response_modalities: None,
        });

        GenerateContentRequest {
            contents,
            system_instruction: request.system.as_deref().map(Content::system),
            tools,
            generation_config,
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        read_json(response).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| GatewayError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        read_json(response).await
    }
}

// GeminiProvider intentionally does NOT derive Debug to prevent
// accidental exposure of internal state.

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let body = response.text().await.unwrap_or_default();
        return Err(map_error(status.as_u16(), retry_after_ms, body));
    }

    response.json().await.map_err(|e| GatewayError::Provider {
        message: format!("failed to parse response: {e}"),
    })
}

/// Map an HTTP error status plus body to the gateway error taxonomy.
fn map_error(status: u16, retry_after_ms: Option<u64>, body: String) -> GatewayError {
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    match status {
        400 => GatewayError::InvalidRequest(message),
        401 | 403 => GatewayError::AuthenticationFailed,
        429 => GatewayError::RateLimited { retry_after_ms },
        500..=599 => GatewayError::Unavailable(message),
        _ => GatewayError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Pull citations out of the first candidate's grounding metadata.
fn extract_citations(response: &GenerateContentResponse) -> Vec<Citation> {
    response
        .candidates
        .first()
        .and_then(|c| c.grounding_metadata.as_ref())
        .map(|meta| {
            meta.grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .filter(|web| !web.uri.is_empty())
                .map(|web| Citation {
                    title: web.title.clone(),
                    uri: web.uri.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &ResolvedRequest) -> Result<GenerateResponse, GatewayError> {
        let body = Self::to_generate_request(request);
        let url = self.url(&format!("models/{}:generateContent", request.model));

        let response: GenerateContentResponse = self.post_json(&url, &body).await?;
        let citations = extract_citations(&response);

        Ok(GenerateResponse {
            text: response.text(),
            citations,
        })
    }
}

impl MediaProvider for GeminiProvider {
    /// Start a media job.
    ///
    /// Images generate inline: the handle of a finished image is a
    /// `data:` URI and the first poll reports done. Videos start a
    /// long-running operation and the handle is its name.
    async fn start_job(&self, params: &MediaJobParams) -> Result<MediaJobHandle, GatewayError> {
        match params.kind {
            MediaKind::Image => {
                let body = GenerateContentRequest {
                    contents: vec![Content::text("user", &params.prompt)],
                    system_instruction: None,
                    tools: None,
                    generation_config: Some(GenerationConfig {
                        response_modalities: Some(vec![
                            "IMAGE".to_string(),
                            "TEXT".to_string(),
                        ]),
                        ..GenerationConfig::default()
                    }),
                };
                let url = self.url(&format!("models/{}:generateContent", self.catalog.image));

                let response: GenerateContentResponse = self.post_json(&url, &body).await?;
                let image = response.first_inline_data().ok_or_else(|| GatewayError::Provider {
                    message: "image response contained no image data".to_string(),
                })?;

                Ok(MediaJobHandle(format!(
                    "data:{};base64,{}",
                    image.mime_type, image.data
                )))
            }
            MediaKind::Video => {
                let body = PredictLongRunningRequest {
                    instances: vec![VideoInstance {
                        prompt: params.prompt.clone(),
                    }],
                };
                let url = self.url(&format!(
                    "models/{}:predictLongRunning",
                    self.catalog.video
                ));

                let operation: Operation = self.post_json(&url, &body).await?;
                Ok(MediaJobHandle(operation.name))
            }
        }
    }

    async fn poll_job(&self, handle: &MediaJobHandle) -> Result<MediaJobStatus, GatewayError> {
        // Inline jobs embed the finished artifact in the handle.
        if handle.0.starts_with("data:") {
            return Ok(MediaJobStatus {
                done: true,
                result_uri: Some(handle.0.clone()),
            });
        }

        let url = self.url(&handle.0);
        let operation: Operation = self.get_json(&url).await?;

        if let Some(error) = operation.error {
            return Err(GatewayError::Provider {
                message: format!("media job failed: {}", error.message),
            });
        }

        let result_uri = operation
            .response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .and_then(|v| v.generated_samples.first())
            .and_then(|s| s.video.as_ref())
            .map(|v| v.uri.clone())
            .filter(|uri| !uri.is_empty());

        Ok(MediaJobStatus {
            done: operation.done,
            result_uri,
        })
    }
}
