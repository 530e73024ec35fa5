//! AI gateway request/response types.
//!
//! These are provider-agnostic: the gateway routes a [`GenerateRequest`] to
//! a capability tier, resolves the tier to a concrete model id via the
//! configured catalog, and hands the resolved request to a provider
//! implementation in `doppel-infra`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::Attachment;
use crate::twin::MediaKind;

/// Capability tier a request targets.
///
/// `Fast` is the cheap low-latency model; `Reasoning` the higher-quality
/// one. The tier-to-model mapping lives in [`crate::config::ModelCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Reasoning,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTier::Fast => write!(f, "fast"),
            ModelTier::Reasoning => write!(f, "reasoning"),
        }
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(ModelTier::Fast),
            "reasoning" => Ok(ModelTier::Reasoning),
            _ => Err(format!("unknown model tier: {s}")),
        }
    }
}

/// A web-grounding citation returned alongside generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

/// A named JSON Schema constraining structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

/// Author of a conversational turn sent to the gateway.
///
/// System-role messages are never part of gateway context (the turn engine
/// filters them during assembly), so no `System` variant exists here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One role-tagged turn of gateway context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            attachment: None,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Option<Attachment>) -> Self {
        self.attachment = attachment;
        self
    }
}

/// Either a flat prompt or a role-tagged history plus new message.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateInput {
    Prompt(String),
    Chat {
        history: Vec<ChatTurn>,
        message: ChatTurn,
    },
}

/// A request through the AI gateway.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Explicit tier override. When `None`, the gateway routes by flags.
    pub tier: Option<ModelTier>,
    pub input: GenerateInput,
    /// System instruction for this call.
    pub system: Option<String>,
    /// Extended-reasoning token budget. Setting this routes to the
    /// reasoning tier unless an explicit tier overrides.
    pub reasoning_budget: Option<u32>,
    /// Ask the provider to ground the answer with web search.
    pub grounding: bool,
    /// Constrain output to a JSON schema. Parse failures are operation
    /// failures, never silently coerced.
    pub response_schema: Option<ResponseSchema>,
    /// Tier to try exactly once after retries on the primary exhaust.
    pub fallback_tier: Option<ModelTier>,
    pub temperature: Option<f64>,
}

impl GenerateRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            tier: None,
            input: GenerateInput::Prompt(text.into()),
            system: None,
            reasoning_budget: None,
            grounding: false,
            response_schema: None,
            fallback_tier: None,
            temperature: None,
        }
    }

    pub fn chat(history: Vec<ChatTurn>, message: ChatTurn) -> Self {
        Self {
            tier: None,
            input: GenerateInput::Chat { history, message },
            system: None,
            reasoning_budget: None,
            grounding: false,
            response_schema: None,
            fallback_tier: None,
            temperature: None,
        }
    }

    pub fn with_tier(mut self, tier: ModelTier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_reasoning_budget(mut self, tokens: u32) -> Self {
        self.reasoning_budget = Some(tokens);
        self
    }

    pub fn with_grounding(mut self, grounding: bool) -> Self {
        self.grounding = grounding;
        self
    }

    pub fn with_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_fallback_tier(mut self, tier: ModelTier) -> Self {
        self.fallback_tier = Some(tier);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Tier routing: an explicit tier wins; otherwise a reasoning budget
    /// routes high, a grounding-only request routes fast, and the default
    /// is the reasoning tier.
    pub fn primary_tier(&self) -> ModelTier {
        if let Some(tier) = self.tier {
            return tier;
        }
        if self.reasoning_budget.is_some() {
            ModelTier::Reasoning
        } else if self.grounding {
            ModelTier::Fast
        } else {
            ModelTier::Reasoning
        }
    }
}

/// Text plus any grounding citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl GenerateResponse {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
        }
    }
}

/// Explicit retry policy consumed by the gateway's retry executor.
///
/// Attempt `n` (0-based) waits `base_delay * 2^n`, capped at `max_delay`,
/// before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts against the primary tier, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given 0-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Parameters for a long-running media generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaJobParams {
    pub kind: MediaKind,
    pub prompt: String,
}

/// Opaque handle identifying a started media job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaJobHandle(pub String);

/// Poll result for a media job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaJobStatus {
    pub done: bool,
    pub result_uri: Option<String>,
}
