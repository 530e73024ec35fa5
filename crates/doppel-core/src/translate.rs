//! Plain-text translation on the fast tier.

use doppel_types::error::GatewayError;
use doppel_types::gateway::{GenerateRequest, ModelTier};

use crate::gateway::{AiGateway, TextProvider};

const TRANSLATE_SYSTEM_PROMPT: &str = "\
You are a translator. Reply with only the translation: no preamble, no \
notes, no quotation marks around the result.";

/// Translate `text` into `target_language` (a plain language name such
/// as "Japanese" or "Brazilian Portuguese").
#[tracing::instrument(skip(gateway, text))]
pub async fn translate<P: TextProvider>(
    gateway: &AiGateway<P>,
    text: &str,
    target_language: &str,
) -> Result<String, GatewayError> {
    let prompt = format!("Translate the following text to {target_language}:\n\n{text}");
    let request = GenerateRequest::prompt(prompt)
        .with_system(TRANSLATE_SYSTEM_PROMPT)
        .with_tier(ModelTier::Fast);
    let response = gateway.generate(&request).await?;
    Ok(response.text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast_policy, MockProvider};
    use doppel_types::config::ModelCatalog;

    #[tokio::test]
    async fn test_translate_uses_fast_tier_and_trims() {
        let provider = MockProvider::new();
        provider.push_text("  Bonjour le monde  \n").await;
        let gateway = AiGateway::new(provider, ModelCatalog::default(), fast_policy());

        let out = translate(&gateway, "Hello world", "French").await.unwrap();
        assert_eq!(out, "Bonjour le monde");

        let requests = gateway.provider().requests().await;
        assert_eq!(requests[0].model, ModelCatalog::default().fast);
        assert!(requests[0].turns[0].text.contains("French"));
        assert!(requests[0].turns[0].text.contains("Hello world"));
    }
}
