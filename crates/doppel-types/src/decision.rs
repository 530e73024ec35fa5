//! Decision simulation records and structured-output drafts.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::ResponseSchema;
use crate::profile::Profile;

/// Number of adversarial expert personas an expert-mode simulation must
/// produce. Anything else is a shape failure.
pub const EXPERT_COUNT: usize = 3;

/// One synthesized adversarial expert persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertOpinion {
    /// e.g. "Risk-averse CFO".
    pub role: String,
    /// Stylistic description of how this persona argues.
    pub style: String,
    pub opinion: String,
}

/// A persisted simulated decision.
///
/// `context_profile` is a deep-copy snapshot taken at decision time, so
/// later profile edits never retroactively alter history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub question: String,
    pub decision: String,
    #[serde(default)]
    pub experts: Vec<ExpertOpinion>,
    pub context_profile: Profile,
}

impl DecisionRecord {
    pub fn new(
        question: impl Into<String>,
        decision: impl Into<String>,
        experts: Vec<ExpertOpinion>,
        context_profile: Profile,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            question: question.into(),
            decision: decision.into(),
            experts,
            context_profile,
        }
    }
}

/// Structured-output shape for expert-mode simulation: the first-person
/// decision and the adversarial panel, produced by one atomic call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExpertPanelDraft {
    /// The decision, written in the user's first-person voice.
    pub decision: String,
    /// Exactly three expert personas chosen to maximize perspective
    /// conflict with each other and with the decision.
    pub experts: Vec<ExpertOpinionDraft>,
}

/// One expert persona inside [`ExpertPanelDraft`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExpertOpinionDraft {
    /// Professional role of the persona.
    pub role: String,
    /// How the persona argues, in a short phrase.
    pub style: String,
    /// The persona's contrarian take on the decision.
    pub opinion: String,
}

impl ExpertPanelDraft {
    pub fn output_schema() -> ResponseSchema {
        ResponseSchema {
            name: "expert_panel".to_string(),
            schema: schemars::schema_for!(ExpertPanelDraft).to_value(),
        }
    }
}

impl From<ExpertOpinionDraft> for ExpertOpinion {
    fn from(draft: ExpertOpinionDraft) -> Self {
        Self {
            role: draft.role,
            style: draft.style,
            opinion: draft.opinion,
        }
    }
}
