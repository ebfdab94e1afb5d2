pub mod config;
pub mod embedding;
pub mod llm;
pub mod providers;
pub mod vector_store;

pub use config::{AppConfig, Config, ConfigError};
pub use embedding::{HashingEmbedding, OpenAiEmbedding};
pub use llm::AnthropicLlm;
pub use providers::{build_embedding, build_llm};
pub use vector_store::InMemoryVectorStore;
