//! Capability traits for model backends.
//!
//! These are the core abstractions the engines talk through. Text and
//! media use RPITIT (Rust 2024 edition); live sessions hand back a
//! channel pair so capture and playback can run concurrently.

use tokio::sync::mpsc;

use doppel_types::error::GatewayError;
use doppel_types::gateway::{
    ChatTurn, GenerateResponse, MediaJobHandle, MediaJobParams, MediaJobStatus, ResponseSchema,
};
use doppel_types::live::{AudioFrame, LiveConfig, LiveEvent};

/// A gateway request resolved against the model catalog.
///
/// Tier routing has already happened: `model` is the concrete model id
/// the provider should call, and `turns` is the full ordered input
/// (history, then the outgoing message last).
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub model: String,
    pub turns: Vec<ChatTurn>,
    pub system: Option<String>,
    pub reasoning_budget: Option<u32>,
    pub grounding: bool,
    pub response_schema: Option<ResponseSchema>,
    pub temperature: Option<f64>,
}

/// Trait for text-generation backends.
///
/// Implementations live in doppel-infra (e.g. `GeminiProvider`).
pub trait TextProvider: Send + Sync {
    /// Stable provider name for spans and logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send a resolved request and receive the full response.
    fn generate(
        &self,
        request: &ResolvedRequest,
    ) -> impl std::future::Future<Output = Result<GenerateResponse, GatewayError>> + Send;
}

/// Trait for bidirectional live-audio backends.
pub trait LiveProvider: Send + Sync {
    /// Open a live session and return its duplex handle.
    ///
    /// The returned handle owns the session: dropping it (or sending
    /// [`LiveCommand::Close`]) tears the connection down.
    fn open_live(
        &self,
        config: LiveConfig,
    ) -> impl std::future::Future<Output = Result<LiveHandle, GatewayError>> + Send;
}

/// Trait for asynchronous media-generation backends.
///
/// Jobs are started and then polled until done. Backends that produce
/// results synchronously report `done` on the first poll.
pub trait MediaProvider: Send + Sync {
    /// Start a generation job.
    fn start_job(
        &self,
        params: &MediaJobParams,
    ) -> impl std::future::Future<Output = Result<MediaJobHandle, GatewayError>> + Send;

    /// Check on a previously started job.
    fn poll_job(
        &self,
        handle: &MediaJobHandle,
    ) -> impl std::future::Future<Output = Result<MediaJobStatus, GatewayError>> + Send;
}

/// Client-to-session commands for a live audio session.
#[derive(Debug)]
pub enum LiveCommand {
    /// A captured microphone frame to forward upstream.
    Audio(AudioFrame),
    /// Close the session cleanly.
    Close,
}

/// Duplex handle to an open live session.
///
/// Commands flow up (audio frames, close); events flow down (model
/// audio, transcript deltas, turn boundaries, interruptions). The two
/// directions are independent channels so sending never blocks on
/// receiving.
pub struct LiveHandle {
    pub commands: mpsc::Sender<LiveCommand>,
    pub events: mpsc::Receiver<LiveEvent>,
}

impl LiveHandle {
    /// Create a handle plus the provider-side endpoints.
    ///
    /// The provider keeps the returned receiver/sender pair and drives
    /// them from its transport task.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LiveCommand>, mpsc::Sender<LiveEvent>) {
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let handle = Self {
            commands: command_tx,
            events: event_rx,
        };
        (handle, command_rx, event_tx)
    }
}
