//! Distills personality signals from a transcript into the profile.
//!
//! One structured-output call per analysis: the model receives the
//! current profile and a bounded transcript window, and returns the
//! complete merged profile. The synthesizer never writes state; callers
//! persist the result (and stamp `updated_at`) through the state owner.

use std::sync::Arc;

use doppel_types::error::GatewayError;
use doppel_types::gateway::GenerateRequest;
use doppel_types::profile::{Profile, ProfileCategory, ProfileDraft};
use doppel_types::session::{ChatMessage, MessageRole};

use crate::gateway::{AiGateway, TextProvider};

/// Most recent transcript messages considered per analysis.
pub const TRANSCRIPT_WINDOW: usize = 50;

const MERGE_TEMPERATURE: f64 = 0.2;

const MERGE_SYSTEM_PROMPT: &str = "\
You maintain a personality profile for a user based on their conversations. \
You receive the existing profile and a recent transcript. Return the complete \
updated profile: keep every existing entry that still holds, add new entries \
the transcript reveals, and fold near-duplicates into one concise phrasing. \
Each entry is a short phrase. Only include things the user actually \
demonstrated or stated; do not invent.";

/// Merges transcript-derived personality signals into a profile.
pub struct ProfileSynthesizer<P> {
    gateway: Arc<AiGateway<P>>,
}

impl<P: TextProvider> ProfileSynthesizer<P> {
    pub fn new(gateway: Arc<AiGateway<P>>) -> Self {
        Self { gateway }
    }

    /// Produce the merged profile for `log` on top of `current`.
    ///
    /// Returns `current` unchanged (no model call) when the window has
    /// no conversational messages.
    #[tracing::instrument(name = "synthesize_profile", skip_all, fields(log_len = log.len()))]
    pub async fn analyze(
        &self,
        log: &[ChatMessage],
        current: &Profile,
    ) -> Result<Profile, GatewayError> {
        let transcript = render_transcript(log);
        if transcript.is_empty() {
            return Ok(current.clone());
        }

        let prompt = format!(
            "Existing profile:\n{}\n\nRecent conversation:\n{transcript}",
            render_profile(current)
        );
        let request = GenerateRequest::prompt(prompt)
            .with_system(MERGE_SYSTEM_PROMPT)
            .with_schema(ProfileDraft::output_schema())
            .with_temperature(MERGE_TEMPERATURE);

        let draft: ProfileDraft = self.gateway.generate_structured(&request).await?;
        Ok(draft.into_profile())
    }
}

/// Render the window as labeled lines, oldest first. System messages are
/// not conversation and are skipped.
fn render_transcript(log: &[ChatMessage]) -> String {
    let mut lines: Vec<String> = log
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .rev()
        .take(TRANSCRIPT_WINDOW)
        .map(|m| {
            let speaker = match m.role {
                MessageRole::User => "User",
                _ => "Twin",
            };
            format!("{speaker}: {}", m.text)
        })
        .collect();
    lines.reverse();
    lines.join("\n")
}

fn render_profile(profile: &Profile) -> String {
    if profile.is_empty() {
        return "(empty)".to_string();
    }
    let mut out = String::new();
    for category in ProfileCategory::ALL {
        let entries = profile.entries(category);
        if !entries.is_empty() {
            out.push_str(category.label());
            out.push_str(": ");
            out.push_str(&entries.join(", "));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast_policy, MockProvider};
    use doppel_types::config::ModelCatalog;

    fn synthesizer(provider: MockProvider) -> ProfileSynthesizer<MockProvider> {
        ProfileSynthesizer::new(Arc::new(AiGateway::new(
            provider,
            ModelCatalog::default(),
            fast_policy(),
        )))
    }

    fn log_of(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("line {i}"))
                } else {
                    ChatMessage::model(format!("line {i}"))
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_analyze_returns_merged_profile() {
        let provider = MockProvider::new();
        provider
            .push_text(r#"{"values": ["honesty"], "interests": ["sailing"]}"#)
            .await;
        let synthesizer = synthesizer(provider);

        let merged = synthesizer
            .analyze(&log_of(4), &Profile::default())
            .await
            .unwrap();
        assert_eq!(merged.values, vec!["honesty"]);
        assert_eq!(merged.interests, vec!["sailing"]);
        assert!(merged.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_transcript_window_is_bounded() {
        let provider = MockProvider::new();
        provider.push_text("{}").await;
        let synthesizer = synthesizer(provider);

        synthesizer
            .analyze(&log_of(67), &Profile::default())
            .await
            .unwrap();

        let requests = synthesizer.gateway.provider().requests().await;
        let prompt = &requests[0].turns[0].text;
        // Window starts at message 17 (67 - 50) and reaches the last one.
        assert!(!prompt.contains("line 16\n"));
        assert!(prompt.contains("line 17"));
        assert!(prompt.contains("line 66"));
    }

    #[tokio::test]
    async fn test_existing_profile_is_part_of_the_prompt() {
        let provider = MockProvider::new();
        provider.push_text("{}").await;
        let synthesizer = synthesizer(provider);

        let mut current = Profile::default();
        current.mental_models.push("inversion".to_string());
        synthesizer.analyze(&log_of(2), &current).await.unwrap();

        let requests = synthesizer.gateway.provider().requests().await;
        assert!(requests[0].turns[0].text.contains("inversion"));
        assert!(requests[0].response_schema.is_some());
        assert_eq!(requests[0].temperature, Some(MERGE_TEMPERATURE));
    }

    #[tokio::test]
    async fn test_missing_fields_default_to_empty() {
        let provider = MockProvider::new();
        provider.push_text(r#"{"values": ["candor"]}"#).await;
        let synthesizer = synthesizer(provider);

        let merged = synthesizer
            .analyze(&log_of(2), &Profile::default())
            .await
            .unwrap();
        assert_eq!(merged.values, vec!["candor"]);
        assert!(merged.work_habits.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_output_is_a_shape_error() {
        let provider = MockProvider::new();
        provider.push_text("I refuse to answer in JSON.").await;
        let synthesizer = synthesizer(provider);

        let result = synthesizer.analyze(&log_of(2), &Profile::default()).await;
        assert!(matches!(result, Err(GatewayError::Shape(_))));
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_the_model_call() {
        // No scripted response: a call would return the exhausted error.
        let provider = MockProvider::new();
        let synthesizer = synthesizer(provider);

        let mut current = Profile::default();
        current.values.push("calm".to_string());
        let log = vec![ChatMessage::system("Profile updated.")];
        let result = synthesizer.analyze(&log, &current).await.unwrap();

        assert_eq!(result, current);
        assert_eq!(synthesizer.gateway.provider().call_count(), 0);
    }
}
