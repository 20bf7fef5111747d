//! The AI collaborator contract and its LLM-backed implementation.

use async_trait::async_trait;
use chronicle_core::{ConsequencePayload, DetectionPayload};
use tracing::{debug, instrument};

use crate::client::LlmClient;
use crate::error::Result;
use crate::parse::parse_payload;
use crate::prompt::{PromptId, PromptSet};
use crate::types::LlmRequest;

/// The generative collaborator behind the world model.
///
/// `detect` and `analyze_consequences` return an empty payload for
/// malformed output; `Err` is reserved for transport failures, which the
/// engine degrades to a fallback narrative.
#[async_trait]
pub trait WorldOracle: Send + Sync {
    /// Story text continuing from the player's input.
    async fn narrate(&self, player_input: &str, narrative_context: &str, world_summary: &str) -> Result<String>;

    /// New entities, relationships and world deltas the passage implies.
    async fn detect(&self, player_input: &str, narrative_context: &str, world_summary: &str)
        -> Result<DetectionPayload>;

    /// What a chosen action changes, including player standing effects.
    async fn analyze_consequences(
        &self,
        player_input: &str,
        choice_text: &str,
        world_summary: &str,
    ) -> Result<ConsequencePayload>;
}

/// [`WorldOracle`] backed by an [`LlmClient`] and a [`PromptSet`].
#[derive(Debug, Clone)]
pub struct LlmOracle {
    client: LlmClient,
    prompts: PromptSet,
    timeout_ms: u64,
}

impl LlmOracle {
    /// Oracle over `client` with the built-in prompts.
    #[must_use]
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            prompts: PromptSet::builtin(),
            timeout_ms: 30_000,
        }
    }

    /// Replace the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The underlying client.
    #[must_use]
    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    fn request(&self, id: PromptId, vars: &[(&str, &str)]) -> Result<LlmRequest> {
        let (system, user) = self.prompts.render(id, vars)?;
        let request = match id {
            PromptId::Narration => LlmRequest::prose(system, user),
            PromptId::Detection | PromptId::Consequence => LlmRequest::structured(system, user),
        };
        let request = match self.prompts.get(id) {
            Some(tpl) => request.with_sampling(tpl.max_tokens, tpl.temperature),
            None => request,
        };
        Ok(request.with_timeout(self.timeout_ms))
    }
}

#[async_trait]
impl WorldOracle for LlmOracle {
    #[instrument(skip_all)]
    async fn narrate(&self, player_input: &str, narrative_context: &str, world_summary: &str) -> Result<String> {
        let request = self.request(
            PromptId::Narration,
            &[
                ("player_input", player_input),
                ("narrative_context", narrative_context),
                ("world_summary", world_summary),
            ],
        )?;
        let response = self.client.generate(&request).await?;
        debug!(tokens = response.tokens_generated, latency_ms = response.latency_ms, "narration received");
        Ok(response.text.trim().to_string())
    }

    #[instrument(skip_all)]
    async fn detect(
        &self,
        player_input: &str,
        narrative_context: &str,
        world_summary: &str,
    ) -> Result<DetectionPayload> {
        let request = self.request(
            PromptId::Detection,
            &[
                ("player_input", player_input),
                ("narrative_context", narrative_context),
                ("world_summary", world_summary),
            ],
        )?;
        let response = self.client.generate(&request).await?;
        Ok(parse_payload(&response.text, "detect"))
    }

    #[instrument(skip_all)]
    async fn analyze_consequences(
        &self,
        player_input: &str,
        choice_text: &str,
        world_summary: &str,
    ) -> Result<ConsequencePayload> {
        let request = self.request(
            PromptId::Consequence,
            &[
                ("player_input", player_input),
                ("choice_text", choice_text),
                ("world_summary", world_summary),
            ],
        )?;
        let response = self.client.generate(&request).await?;
        Ok(parse_payload(&response.text, "analyze_consequences"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::types::ResponseFormat;

    #[test]
    fn requests_follow_prompt_kind() {
        let oracle = LlmOracle::new(LlmClient::none()).with_timeout(1_500);
        let narration = oracle
            .request(PromptId::Narration, &[("player_input", "look around")])
            .expect("request");
        assert_eq!(narration.format, ResponseFormat::Text);
        assert_eq!(narration.timeout_ms, 1_500);
        assert!(narration.user.contains("look around"));

        let detection = oracle.request(PromptId::Detection, &[]).expect("request");
        assert_eq!(detection.format, ResponseFormat::Json);
    }

    #[tokio::test]
    async fn offline_oracle_reports_unavailable() {
        let oracle = LlmOracle::new(LlmClient::none());
        let err = oracle.narrate("hello", "", "").await.expect_err("offline");
        assert!(matches!(err, LlmError::Unavailable(_)));
        assert!(oracle.detect("hello", "", "").await.is_err());
    }
}
