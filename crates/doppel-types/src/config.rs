//! Global configuration for Doppel.
//!
//! `DoppelConfig` represents the top-level `config.toml` controlling model
//! selection, retry behavior, and media polling.
//!
//! Loaded from `~/.doppel/config.toml`. All fields have sensible defaults,
//! so an absent or empty file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gateway::{ModelTier, RetryPolicy};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoppelConfig {
    #[serde(default)]
    pub models: ModelCatalog,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

/// Concrete model ids behind each capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    /// Cheap low-latency tier.
    #[serde(default = "default_fast_model")]
    pub fast: String,

    /// Higher-reasoning tier.
    #[serde(default = "default_reasoning_model")]
    pub reasoning: String,

    /// Native-audio live dialog model.
    #[serde(default = "default_live_model")]
    pub live: String,

    /// Image generation model.
    #[serde(default = "default_image_model")]
    pub image: String,

    /// Long-running video generation model.
    #[serde(default = "default_video_model")]
    pub video: String,
}

fn default_fast_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_reasoning_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_live_model() -> String {
    "gemini-2.5-flash-native-audio-preview-09-2025".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_video_model() -> String {
    "veo-3.0-generate-001".to_string()
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            fast: default_fast_model(),
            reasoning: default_reasoning_model(),
            live: default_live_model(),
            image: default_image_model(),
            video: default_video_model(),
        }
    }
}

impl ModelCatalog {
    /// Resolve a capability tier to its concrete model id.
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Reasoning => &self.reasoning,
        }
    }
}

/// Retry behavior for transient gateway failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts against the primary tier, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay, doubling per attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff ceiling.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Polling behavior for long-running media jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Wall-clock deadline for one media job.
    #[serde(default = "default_media_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_media_timeout_secs() -> u64 {
    600
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_media_timeout_secs(),
        }
    }
}
