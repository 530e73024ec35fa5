//! Answers "what would I decide?" from the profile.
//!
//! Two modes. Solo: one high-reasoning call that produces the twin's
//! first-person decision. Expert panel: one atomic structured call that
//! produces the decision plus exactly three adversarial expert
//! critiques; a panel of any other size is a shape failure, never
//! padded or truncated. Every simulation persists a record carrying a
//! snapshot of the profile it was conditioned on.

use std::sync::Arc;

use doppel_types::decision::{DecisionRecord, ExpertPanelDraft, EXPERT_COUNT};
use doppel_types::error::{GatewayError, SimulationError};
use doppel_types::gateway::GenerateRequest;
use doppel_types::profile::{Profile, ProfileCategory};
use doppel_types::twin::POINTS_DECISION;

use crate::gateway::{AiGateway, TextProvider};
use crate::state::StateOwner;
use crate::storage::KvStore;

/// Reasoning-token budget for solo decisions.
pub const DECISION_REASONING_BUDGET: u32 = 4096;

const DECISION_TEMPERATURE: f64 = 0.7;

const SOLO_SYSTEM_PROMPT: &str = "\
You are the user's digital twin making a decision on their behalf. Speak \
in first person. Weigh the options against the profile provided, commit \
to one course of action, and explain the reasoning briefly. Do not hedge \
with 'it depends'.";

const PANEL_SYSTEM_PROMPT: &str = "\
You are the user's digital twin running a decision review. First, decide \
in first person as the user would, consistent with the profile provided. \
Then convene exactly three experts with sharply different specialties who \
each challenge the decision from their own angle. Experts are adversarial: \
they probe weaknesses, they do not cheerlead. Give each a role, a \
one-line style, and a substantive opinion.";

pub struct DecisionSimulator<K, P> {
    gateway: Arc<AiGateway<P>>,
    state: Arc<StateOwner<K>>,
}

impl<K: KvStore, P: TextProvider> DecisionSimulator<K, P> {
    pub fn new(gateway: Arc<AiGateway<P>>, state: Arc<StateOwner<K>>) -> Self {
        Self { gateway, state }
    }

    /// Simulate a decision, persist the record, and return it.
    #[tracing::instrument(name = "simulate_decision", skip_all, fields(experts = experts))]
    pub async fn simulate(
        &self,
        question: &str,
        experts: bool,
    ) -> Result<DecisionRecord, SimulationError> {
        let profile = self.state.profile().await?;
        let prompt = format!(
            "Decision to make: {question}\n\nMy profile:\n{}",
            render_decision_context(&profile)
        );

        let record = if experts {
            let request = GenerateRequest::prompt(prompt)
                .with_system(PANEL_SYSTEM_PROMPT)
                .with_schema(ExpertPanelDraft::output_schema())
                .with_temperature(DECISION_TEMPERATURE);
            let draft: ExpertPanelDraft = self.gateway.generate_structured(&request).await?;
            if draft.experts.len() != EXPERT_COUNT {
                return Err(GatewayError::Shape(format!(
                    "expected {EXPERT_COUNT} experts, got {}",
                    draft.experts.len()
                ))
                .into());
            }
            DecisionRecord::new(
                question,
                draft.decision,
                draft.experts.into_iter().map(Into::into).collect(),
                profile,
            )
        } else {
            let request = GenerateRequest::prompt(prompt)
                .with_system(SOLO_SYSTEM_PROMPT)
                .with_reasoning_budget(DECISION_REASONING_BUDGET)
                .with_temperature(DECISION_TEMPERATURE);
            let response = self.gateway.generate(&request).await?;
            DecisionRecord::new(question, response.text, Vec::new(), profile)
        };

        self.state.push_decision(record.clone()).await?;
        self.state.award_points("decision simulation", POINTS_DECISION).await?;
        Ok(record)
    }
}

/// The profile slice a decision is conditioned on: who the user is and
/// how they decide. Habits and interests stay out of the prompt but are
/// still part of the snapshot stored with the record.
fn render_decision_context(profile: &Profile) -> String {
    const CATEGORIES: [ProfileCategory; 4] = [
        ProfileCategory::Values,
        ProfileCategory::PersonalityTraits,
        ProfileCategory::MentalModels,
        ProfileCategory::DecisionPrinciples,
    ];

    let mut out = String::new();
    for category in CATEGORIES {
        let entries = profile.entries(category);
        if !entries.is_empty() {
            out.push_str(category.label());
            out.push_str(": ");
            out.push_str(&entries.join(", "));
            out.push('\n');
        }
    }
    if out.is_empty() {
        out.push_str("(no profile yet; decide with common sense)");
    }
    out
}
