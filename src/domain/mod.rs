pub mod chunking;
pub mod entities;
pub mod errors;
pub mod memory;
pub mod ports;

pub use chunking::{chunk_text, ChunkingConfig, TextChunker};
pub use entities::*;
pub use errors::{DomainError, Result};
pub use memory::ConversationMemory;
