use std::sync::Arc;
use tracing::info;

use crate::domain::ports::{EmbeddingService, LlmService};
use crate::infrastructure::config::{ConfigError, EmbeddingConfig, LlmConfig};
use crate::infrastructure::embedding::{HashingEmbedding, OpenAiEmbedding};
use crate::infrastructure::llm::AnthropicLlm;

pub fn build_embedding(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingService>, ConfigError> {
    let service: Arc<dyn EmbeddingService> = match config.provider.as_str() {
        "openai" => Arc::new(OpenAiEmbedding::from_config(config)),
        "hashing" => Arc::new(HashingEmbedding::new(config.dimension)),
        other => {
            return Err(ConfigError::Invalid(format!(
                "unknown embedding provider {other:?}"
            )))
        }
    };
    info!(provider = %config.provider, model = %config.model, dimension = config.dimension, "embedding service configured");
    Ok(service)
}

pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmService>, ConfigError> {
    match config.provider.as_str() {
        "anthropic" => {
            info!(model = %config.model, "generation service configured");
            Ok(Arc::new(AnthropicLlm::new(config.model.clone())))
        }
        other => Err(ConfigError::Invalid(format!("unknown llm provider {other:?}"))),
    }
}
