use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::anthropic;
use tracing::instrument;

use crate::domain::{
    ports::{GenerationOptions, LlmService},
    DomainError,
};

/// Anthropic completions through rig. Reads `ANTHROPIC_API_KEY` from the environment.
pub struct AnthropicLlm {
    model: String,
}

impl AnthropicLlm {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

#[async_trait]
impl LlmService for AnthropicLlm {
    #[instrument(skip(self, prompt, options), fields(model = %self.model))]
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, DomainError> {
        let client = anthropic::Client::from_env();
        let agent = client
            .agent(&self.model)
            .temperature(options.temperature as f64)
            .max_tokens(options.max_tokens)
            .build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::generation(e.to_string()))
    }

    #[instrument(skip(self, system, prompt, options), fields(model = %self.model))]
    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, DomainError> {
        let client = anthropic::Client::from_env();
        let agent = client
            .agent(&self.model)
            .preamble(system)
            .temperature(options.temperature as f64)
            .max_tokens(options.max_tokens)
            .build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::generation(e.to_string()))
    }
}
