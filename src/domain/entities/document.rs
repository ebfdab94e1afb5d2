use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plain text handed over by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A contiguous span of a document's text.
///
/// `start` and `length` count chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub document_id: String,
    pub content: String,
    pub start: usize,
    pub length: usize,
    pub chunk_index: usize,
}

impl Chunk {
    pub fn new(
        document_id: impl Into<String>,
        content: impl Into<String>,
        start: usize,
        chunk_index: usize,
    ) -> Self {
        let document_id = document_id.into();
        let content = content.into();
        let length = content.chars().count();
        Self {
            id: chunk_id(&document_id, start, length),
            document_id,
            content,
            start,
            length,
            chunk_index,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            chunk_id: self.id,
            document_id: self.document_id.clone(),
            start: self.start,
            length: self.length,
        }
    }
}

/// Stable id for a span so re-ingesting the same text yields the same chunks.
pub fn chunk_id(document_id: &str, start: usize, length: usize) -> Uuid {
    let name = format!("{document_id}:{start}:{length}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Citation of a chunk recorded on an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub chunk_id: Uuid,
    pub document_id: String,
    pub start: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}
