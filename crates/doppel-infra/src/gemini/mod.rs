//! Gemini API bindings: REST text/media provider and Live WebSocket client.

pub mod client;
pub mod live;
pub mod types;

pub use client::GeminiProvider;
