//! Gemini Live WebSocket binding.
//!
//! Implements [`LiveProvider`] for [`GeminiProvider`] over the
//! `BidiGenerateContent` protocol: a setup handshake, base64 16 kHz PCM
//! uplink, and a downlink of model audio, per-speaker transcription
//! deltas, and turn-boundary signals. A spawned transport task bridges
//! the socket onto the [`LiveHandle`] channel pair.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

use doppel_core::gateway::{LiveCommand, LiveHandle, LiveProvider};
use doppel_types::error::GatewayError;
use doppel_types::live::{AudioFrame, LiveConfig, LiveEvent, PLAYBACK_SAMPLE_RATE, Speaker};

use super::client::GeminiProvider;
use super::types::{
    AudioTranscriptionConfig, Content, InlineData, LiveGenerationConfig, LiveSetup,
    RealtimeInput, RealtimeInputMessage, ServerContent, ServerMessage, SetupMessage,
};

/// Buffered frames per direction before backpressure.
const LIVE_CHANNEL_CAPACITY: usize = 64;

const BIDI_PATH: &str = "google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

impl LiveProvider for GeminiProvider {
    async fn open_live(&self, config: LiveConfig) -> Result<LiveHandle, GatewayError> {
        let url = format!(
            "{}/{}?key={}",
            self.ws_base_url(),
            BIDI_PATH,
            self.api_key().expose_secret()
        );

        let (mut ws, _response) = connect_async(url.as_str())
            .await
            .map_err(map_connect_error)?;

        let setup = SetupMessage {
            setup: LiveSetup {
                model: format!("models/{}", config.model),
                generation_config: Some(LiveGenerationConfig {
                    response_modalities: vec!["AUDIO".to_string()],
                }),
                system_instruction: config.system.as_deref().map(Content::system),
                input_audio_transcription: Some(AudioTranscriptionConfig {}),
                output_audio_transcription: Some(AudioTranscriptionConfig {}),
            },
        };
        let setup_json = serde_json::to_string(&setup).map_err(|e| GatewayError::Provider {
            message: format!("failed to encode live setup: {e}"),
        })?;
        ws.send(Message::text(setup_json))
            .await
            .map_err(|e| GatewayError::Unavailable(format!("live setup send failed: {e}")))?;

        wait_for_setup_complete(&mut ws).await?;
        tracing::info!(model = %config.model, "Live session open");

        let (handle, command_rx, event_tx) = LiveHandle::channel(LIVE_CHANNEL_CAPACITY);
        tokio::spawn(run_transport(ws, command_rx, event_tx));

        Ok(handle)
    }
}

fn map_connect_error(error: tungstenite::Error) -> GatewayError {
    match error {
        tungstenite::Error::Http(response) => {
            let status = response.status();
            match status.as_u16() {
                401 | 403 => GatewayError::AuthenticationFailed,
                429 => GatewayError::RateLimited {
                    retry_after_ms: None,
                },
                _ => GatewayError::Unavailable(format!("live handshake failed: HTTP {status}")),
            }
        }
        other => GatewayError::Unavailable(format!("live connection failed: {other}")),
    }
}

/// Read until the server acknowledges the setup message.
async fn wait_for_setup_complete(ws: &mut WsStream) -> Result<(), GatewayError> {
    loop {
        match ws.next().await {
            Some(Ok(message)) => {
                if matches!(message, Message::Close(_)) {
                    return Err(GatewayError::Unavailable(
                        "live channel closed during setup".to_string(),
                    ));
                }
                if let Some(parsed) = parse_server_message(&message) {
                    if parsed.setup_complete.is_some() {
                        return Ok(());
                    }
                }
            }
            Some(Err(e)) => {
                return Err(GatewayError::Unavailable(format!("live setup failed: {e}")));
            }
            None => {
                return Err(GatewayError::Unavailable(
                    "live channel closed during setup".to_string(),
                ));
            }
        }
    }
}

/// Bridge the socket and the handle channels until either side closes.
async fn run_transport(
    mut ws: WsStream,
    mut commands: mpsc::Receiver<LiveCommand>,
    events: mpsc::Sender<LiveEvent>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(LiveCommand::Audio(frame)) => {
                    let encoded = match encode_audio(&frame) {
                        Ok(message) => message,
                        Err(e) => {
                            let _ = events
                                .send(LiveEvent::Error(format!("failed to encode audio frame: {e}")))
                                .await;
                            break;
                        }
                    };
                    if ws.send(encoded).await.is_err() {
                        let _ = events
                            .send(LiveEvent::Error("live socket send failed".to_string()))
                            .await;
                        break;
                    }
                }
                // A dropped handle tears the session down like an explicit close.
                Some(LiveCommand::Close) | None => {
                    let _ = ws.close(None).await;
                    let _ = events.send(LiveEvent::Closed).await;
                    break;
                }
            },
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    let _ = events.send(LiveEvent::Closed).await;
                    break;
                }
                Some(Ok(message)) => {
                    let Some(parsed) = parse_server_message(&message) else {
                        continue;
                    };
                    if parsed.go_away.is_some() {
                        tracing::warn!("Live server signalled imminent disconnect");
                    }
                    let mut receiver_gone = false;
                    if let Some(content) = parsed.server_content {
                        for event in content_events(content) {
                            if events.send(event).await.is_err() {
                                receiver_gone = true;
                                break;
                            }
                        }
                    }
                    if receiver_gone {
                        let _ = ws.close(None).await;
                        break;
                    }
                }
                Some(Err(e)) => {
                    let _ = events
                        .send(LiveEvent::Error(format!("live socket error: {e}")))
                        .await;
                    break;
                }
            },
        }
    }
    tracing::debug!("Live transport finished");
}

/// Both text and binary frames carry JSON on this protocol.
fn parse_server_message(message: &Message) -> Option<ServerMessage> {
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).ok(),
        Message::Binary(bytes) => serde_json::from_slice(bytes).ok(),
        _ => None,
    }
}

/// Translate one server content frame into handle events.
///
/// Order matters: an interruption invalidates scheduled audio, so it is
/// surfaced before anything else carried by the same frame.
fn content_events(content: ServerContent) -> Vec<LiveEvent> {
    let mut events = Vec::new();

    if content.interrupted {
        events.push(LiveEvent::Interrupted);
    }
    if let Some(transcription) = content.input_transcription {
        if !transcription.text.is_empty() {
            events.push(LiveEvent::TranscriptDelta {
                speaker: Speaker::User,
                text: transcription.text,
            });
        }
    }
    if let Some(transcription) = content.output_transcription {
        if !transcription.text.is_empty() {
            events.push(LiveEvent::TranscriptDelta {
                speaker: Speaker::Model,
                text: transcription.text,
            });
        }
    }
    if let Some(turn) = content.model_turn {
        for part in turn.parts {
            if let Some(inline) = part.inline_data {
                match decode_pcm(&inline) {
                    Ok(frame) if !frame.is_empty() => events.push(LiveEvent::Audio(frame)),
                    Ok(_) => {}
                    Err(e) => {
                        events.push(LiveEvent::Error(format!("bad audio payload: {e}")));
                    }
                }
            }
        }
    }
    if content.turn_complete {
        events.push(LiveEvent::TurnComplete);
    }

    events
}

fn encode_audio(frame: &AudioFrame) -> Result<Message, serde_json::Error> {
    let mut bytes = Vec::with_capacity(frame.samples.len() * 2);
    for sample in &frame.samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    let message = RealtimeInputMessage {
        realtime_input: RealtimeInput {
            audio: InlineData {
                mime_type: format!("audio/pcm;rate={}", frame.sample_rate),
                data: BASE64.encode(&bytes),
            },
        },
    };
    Ok(Message::text(serde_json::to_string(&message)?))
}

/// Decode little-endian base64 PCM into a playback frame, respecting the
/// rate declared in the mime type.
fn decode_pcm(inline: &InlineData) -> Result<AudioFrame, base64::DecodeError> {
    let bytes = BASE64.decode(&inline.data)?;
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let sample_rate = parse_pcm_rate(&inline.mime_type).unwrap_or(PLAYBACK_SAMPLE_RATE);

    Ok(AudioFrame {
        samples,
        sample_rate,
    })
}

fn parse_pcm_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .find_map(|param| param.trim().strip_prefix("rate="))
        .and_then(|rate| rate.parse().ok())
}
