//! Turns a brain dump into an ordered action list.
//!
//! One structured-output call on the fast tier at temperature zero.
//! The model orders tasks by dependency and urgency and phrases each as
//! a verb-led action. Text with nothing actionable yields an empty
//! list, which is a valid result, not an error.

use std::sync::Arc;

use doppel_types::error::GatewayError;
use doppel_types::gateway::{GenerateRequest, ModelTier};
use doppel_types::twin::TaskPlanDraft;

use crate::gateway::{AiGateway, TextProvider};

const EXTRACTION_TEMPERATURE: f64 = 0.0;

const EXTRACTION_SYSTEM_PROMPT: &str = "\
Extract actionable tasks from the user's notes. Order them by what must \
happen first, then by urgency. Phrase each as a short action starting \
with a verb. If nothing is actionable, return an empty list. Never \
invent tasks that are not in the notes.";

pub struct TaskExtractor<P> {
    gateway: Arc<AiGateway<P>>,
}

impl<P: TextProvider> TaskExtractor<P> {
    pub fn new(gateway: Arc<AiGateway<P>>) -> Self {
        Self { gateway }
    }

    /// Extract ordered tasks from `text`.
    #[tracing::instrument(name = "extract_tasks", skip_all)]
    pub async fn extract(&self, text: &str) -> Result<Vec<String>, GatewayError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let request = GenerateRequest::prompt(text)
            .with_system(EXTRACTION_SYSTEM_PROMPT)
            .with_tier(ModelTier::Fast)
            .with_schema(TaskPlanDraft::output_schema())
            .with_temperature(EXTRACTION_TEMPERATURE);

        let draft: TaskPlanDraft = self.gateway.generate_structured(&request).await?;
        Ok(draft
            .tasks
            .into_iter()
            .map(|task| task.trim().to_string())
            .filter(|task| !task.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast_policy, MockProvider};
    use doppel_types::config::ModelCatalog;

    fn extractor(provider: MockProvider) -> TaskExtractor<MockProvider> {
        TaskExtractor::new(Arc::new(AiGateway::new(
            provider,
            ModelCatalog::default(),
            fast_policy(),
        )))
    }

    #[tokio::test]
    async fn test_extract_returns_ordered_tasks() {
        let provider = MockProvider::new();
        provider
            .push_text(r#"{"tasks": ["Book the venue", "Send invitations", "Order catering"]}"#)
            .await;
        let extractor = extractor(provider);

        let tasks = extractor
            .extract("need to sort the party: invites, food, and a venue first")
            .await
            .unwrap();
        assert_eq!(
            tasks,
            vec!["Book the venue", "Send invitations", "Order catering"]
        );
    }

    #[tokio::test]
    async fn test_extract_uses_fast_tier_and_zero_temperature() {
        let provider = MockProvider::new();
        provider.push_text(r#"{"tasks": []}"#).await;
        let extractor = extractor(provider);

        extractor.extract("some notes").await.unwrap();

        let requests = extractor.gateway.provider().requests().await;
        assert_eq!(requests[0].model, ModelCatalog::default().fast);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert!(requests[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn test_nothing_actionable_is_an_empty_list() {
        let provider = MockProvider::new();
        provider.push_text(r#"{"tasks": []}"#).await;
        let extractor = extractor(provider);

        let tasks = extractor.extract("the sky was pretty today").await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_skips_the_model_call() {
        let provider = MockProvider::new();
        let extractor = extractor(provider);

        let tasks = extractor.extract("   \n  ").await.unwrap();
        assert!(tasks.is_empty());
        assert_eq!(extractor.gateway.provider().call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_entries_are_dropped() {
        let provider = MockProvider::new();
        provider
            .push_text(r#"{"tasks": ["  Call mom  ", "", "   "]}"#)
            .await;
        let extractor = extractor(provider);

        let tasks = extractor.extract("call mom").await.unwrap();
        assert_eq!(tasks, vec!["Call mom"]);
    }
}
