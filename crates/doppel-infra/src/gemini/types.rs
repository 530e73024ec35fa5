//! Gemini API wire types.
//!
//! These are Gemini-specific request/response structures used for HTTP and
//! WebSocket communication with the Generative Language API. They are NOT
//! the provider-agnostic types from doppel-types -- those never leak wire
//! details. Field names follow the API's camelCase JSON convention.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// generateContent request
// ---------------------------------------------------------------------------

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A role-tagged sequence of parts. Role is absent on system instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A single-text content block with the given role.
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            parts: vec![Part::text(text)],
        }
    }

    /// A role-less content block, used for system instructions.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

/// One part of a content block: text or inline binary data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
            ..Self::default()
        }
    }
}

/// Base64-encoded bytes plus their media type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// A tool made available to the model. Only Google Search grounding is used.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

/// Marker for the built-in Google Search tool; serializes as `{}`.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleSearch {}

/// Generation tuning for a single request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// "application/json" when a response schema is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    /// ["IMAGE", "TEXT"] for inline image generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
}

/// Reasoning token budget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

// ---------------------------------------------------------------------------
// generateContent response
// ---------------------------------------------------------------------------

/// Response body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    /// The first inline-data part of the first candidate, if any.
    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|p| p.inline_data.as_ref()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// Search-grounding provenance attached to a candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

/// A web page the response was grounded on.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// Error body returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

// ---------------------------------------------------------------------------
// Long-running media operations
// ---------------------------------------------------------------------------

/// Request body for `models/{model}:predictLongRunning` (video generation).
#[derive(Debug, Clone, Serialize)]
pub struct PredictLongRunningRequest {
    pub instances: Vec<VideoInstance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoInstance {
    pub prompt: String,
}

/// A long-running operation, returned by start and by polling.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<OperationResponse>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoRef {
    #[serde(default)]
    pub uri: String,
}

// ---------------------------------------------------------------------------
// BidiGenerateContent (Live WebSocket)
//
// Each client message is a JSON object with exactly one top-level field
// naming the message kind. Separate envelope structs keep that invariant
// in the type system -- there is no way to serialize a hybrid message.
// ---------------------------------------------------------------------------

/// First client message on a live connection.
#[derive(Debug, Clone, Serialize)]
pub struct SetupMessage {
    pub setup: LiveSetup,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSetup {
    /// Fully qualified model name, e.g. "models/gemini-2.5-flash-native-audio-preview-09-2025".
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<LiveGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Present (as `{}`) to enable user speech transcription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<AudioTranscriptionConfig>,
    /// Present (as `{}`) to enable model speech transcription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_transcription: Option<AudioTranscriptionConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGenerationConfig {
    pub response_modalities: Vec<String>,
}

/// Serializes as `{}`; presence alone enables transcription.
#[derive(Debug, Clone, Serialize)]
pub struct AudioTranscriptionConfig {}

/// Streaming microphone audio from client to server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputMessage {
    pub realtime_input: RealtimeInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct RealtimeInput {
    pub audio: InlineData,
}

/// Any message from the server. Exactly one field is populated per frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default)]
    pub setup_complete: Option<serde_json::Value>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
    /// Imminent disconnect warning.
    #[serde(default)]
    pub go_away: Option<serde_json::Value>,
}

/// Model output within a live session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub input_transcription: Option<Transcription>,
    #[serde(default)]
    pub output_transcription: Option<Transcription>,
    #[serde(default)]
    pub turn_complete: bool,
    /// The user started speaking over the model; scheduled audio is stale.
    #[serde(default)]
    pub interrupted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_serialization() {
        let req = GenerateContentRequest {
            contents: vec![Content::text("user", "Hello")],
            system_instruction: Some(Content::system("Be helpful.")),
            tools: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                ..GenerationConfig::default()
            }),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be helpful.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["generationConfig"]["temperature"], 0.7);
        // tools should not appear when None
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_grounding_tool_serializes_as_empty_object() {
        let req = GenerateContentRequest {
            contents: vec![Content::text("user", "What happened today?")],
            system_instruction: None,
            tools: Some(vec![Tool {
                google_search: GoogleSearch {},
            }]),
            generation_config: None,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["tools"][0]["googleSearch"], serde_json::json!({}));
    }

    #[test]
    fn test_thinking_config_serialization() {
        let config = GenerationConfig {
            thinking_config: Some(ThinkingConfig {
                thinking_budget: 4096,
            }),
            ..GenerationConfig::default()
        };

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["thinkingConfig"]["thinkingBudget"], 4096);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_schema_serialization() {
        let config = GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(serde_json::json!({"type": "object"})),
            ..GenerationConfig::default()
        };

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["responseMimeType"], "application/json");
        assert_eq!(json["responseSchema"]["type"], "object");
    }

    #[test]
    fn test_inline_data_part_serialization() {
        let part = Part::inline_data("image/png", "aGVsbG8=");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["inlineData"]["data"], "aGVsbG8=");
        assert!(json.get("text").is_none());
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello "}, {"text": "world"}]
                }
            }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text(), "Hello world");
    }

    #[test]
    fn test_response_empty_candidates() {
        let resp: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.text(), "");
        assert!(resp.first_inline_data().is_none());
    }

    #[test]
    fn test_grounding_metadata_deserialization() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Answer"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://example.com", "title": "Example"}},
                        {"web": {"uri": "https://other.org", "title": "Other"}}
                    ]
                }
            }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let meta = resp.candidates[0].grounding_metadata.as_ref().unwrap();
        assert_eq!(meta.grounding_chunks.len(), 2);
        assert_eq!(meta.grounding_chunks[0].web.as_ref().unwrap().title, "Example");
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let body: ApiErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error.code, 429);
        assert_eq!(body.error.message, "Quota exceeded");
        assert_eq!(body.error.status, "RESOURCE_EXHAUSTED");
    }

    #[test]
    fn test_operation_deserialization_pending() {
        let json = r#"{"name": "operations/abc123"}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(op.name, "operations/abc123");
        assert!(!op.done);
        assert!(op.response.is_none());
    }

    #[test]
    fn test_operation_deserialization_done() {
        let json = r#"{
            "name": "operations/abc123",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": "https://files.example/video.mp4"}}]
                }
            }
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert!(op.done);
        let video_response = op.response.unwrap().generate_video_response.unwrap();
        let uri = &video_response.generated_samples[0].video.as_ref().unwrap().uri;
        assert_eq!(uri, "https://files.example/video.mp4");
    }

    #[test]
    fn test_setup_message_serialization() {
        let msg = SetupMessage {
            setup: LiveSetup {
                model: "models/gemini-live".to_string(),
                generation_config: Some(LiveGenerationConfig {
                    response_modalities: vec!["AUDIO".to_string()],
                }),
                system_instruction: Some(Content::system("You are a twin.")),
                input_audio_transcription: Some(AudioTranscriptionConfig {}),
                output_audio_transcription: Some(AudioTranscriptionConfig {}),
            },
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["setup"]["model"], "models/gemini-live");
        assert_eq!(json["setup"]["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(json["setup"]["inputAudioTranscription"], serde_json::json!({}));
        assert_eq!(json["setup"]["outputAudioTranscription"], serde_json::json!({}));
    }

    #[test]
    fn test_realtime_input_serialization() {
        let msg = RealtimeInputMessage {
            realtime_input: RealtimeInput {
                audio: InlineData {
                    mime_type: "audio/pcm;rate=16000".to_string(),
                    data: "AAAA".to_string(),
                },
            },
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["realtimeInput"]["audio"]["mimeType"], "audio/pcm;rate=16000");
        assert_eq!(json["realtimeInput"]["audio"]["data"], "AAAA");
    }

    #[test]
    fn test_server_message_setup_complete() {
        let msg: ServerMessage = serde_json::from_str(r#"{"setupComplete": {}}"#).unwrap();
        assert!(msg.setup_complete.is_some());
        assert!(msg.server_content.is_none());
    }

    #[test]
    fn test_server_message_audio_and_transcription() {
        let json = r#"{
            "serverContent": {
                "modelTurn": {
                    "parts": [{"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "UklGRg=="}}]
                },
                "outputTranscription": {"text": "Hello there"}
            }
        }"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        let content = msg.server_content.unwrap();
        let part = &content.model_turn.as_ref().unwrap().parts[0];
        assert_eq!(part.inline_data.as_ref().unwrap().mime_type, "audio/pcm;rate=24000");
        assert_eq!(content.output_transcription.unwrap().text, "Hello there");
        assert!(!content.turn_complete);
        assert!(!content.interrupted);
    }

    #[test]
    fn test_server_message_turn_boundaries() {
        let complete: ServerMessage =
            serde_json::from_str(r#"{"serverContent": {"turnComplete": true}}"#).unwrap();
        assert!(complete.server_content.unwrap().turn_complete);

        let interrupted: ServerMessage =
            serde_json::from_str(r#"{"serverContent": {"interrupted": true}}"#).unwrap();
        assert!(interrupted.server_content.unwrap().interrupted);
    }
}
