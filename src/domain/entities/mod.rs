mod conversation;
mod document;
mod embedding;

pub use conversation::{ConversationTurn, TurnRole};
pub use document::{chunk_id, Chunk, Document, SearchResult, SourceRef};
pub use embedding::Embedding;
