//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! implementations, apart from the in-memory store a fresh index is built on.

pub mod engine;
pub mod index;
pub mod ingestion;
pub mod prompt;

pub use engine::{Answer, ConversationEngine, EngineConfig, EngineState};
pub use index::EmbeddingIndex;
pub use ingestion::{DocumentReport, IngestReport, IngestionService};
pub use prompt::{PromptBuilder, PromptTemplates};
