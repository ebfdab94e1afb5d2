use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::application::{EngineConfig, PromptTemplates};
use crate::domain::{ports::GenerationOptions, ChunkingConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings file plus prompt templates, loaded together at startup.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptTemplates,
}

impl AppConfig {
    /// Reads `CONFIG_PATH` and `PROMPTS_PATH` (defaulting to `config/*.yaml`).
    /// Missing files fall back to built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".into());
        let prompts_path =
            std::env::var("PROMPTS_PATH").unwrap_or_else(|_| "config/prompts.yaml".into());

        let mut config: Config = load_yaml_or_default(Path::new(&config_path))?;
        config.apply_env_overrides()?;
        config.validate()?;

        let prompts: PromptTemplates = load_yaml_or_default(Path::new(&prompts_path))?;
        Ok(Self { config, prompts })
    }
}

fn load_yaml_or_default<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub rag: RagConfig,
    pub cors: CorsConfig,
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("SERVER_PORT {port:?} is not a port")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        EngineConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimension must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            top_k: config.rag.top_k,
            history_window: config.rag.history_window,
            max_context_chars: config.rag.max_context_chars,
            condense_question: config.rag.condense_question,
            generation: GenerationOptions {
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            },
            request_timeout: Duration::from_secs(config.llm.timeout_seconds),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            temperature: 0.5,
            max_tokens: 512,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    pub history_window: usize,
    pub max_context_chars: usize,
    pub condense_question: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            history_window: 6,
            max_context_chars: 6000,
            condense_question: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.rag.top_k, 4);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "llm:\n  model: claude-test\nchunking:\n  chunk_size: 300\n  chunk_overlap: 50\n",
        )
        .unwrap();

        assert_eq!(config.llm.model, "claude-test");
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.chunking.chunk_size, 300);
        assert_eq!(config.chunking.separator, "\n");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_invalid_chunking_is_rejected() {
        let result = Config::from_yaml("chunking:\n  chunk_size: 100\n  chunk_overlap: 100\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_temperature_is_rejected() {
        let result = Config::from_yaml("llm:\n  temperature: 1.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_yaml_is_reported() {
        let result = Config::from_yaml("rag: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_engine_config_conversion() {
        let config = Config::from_yaml("rag:\n  top_k: 2\n  condense_question: false\n").unwrap();
        let engine = EngineConfig::from(&config);

        assert_eq!(engine.top_k, 2);
        assert!(!engine.condense_question);
        assert_eq!(engine.request_timeout, Duration::from_secs(60));
        assert_eq!(engine.generation.temperature, 0.5);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let prompts: PromptTemplates =
            load_yaml_or_default(Path::new("does/not/exist.yaml")).unwrap();
        assert_eq!(prompts, PromptTemplates::default());
    }
}
