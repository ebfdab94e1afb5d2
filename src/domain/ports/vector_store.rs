use crate::domain::{errors::DomainError, Chunk, Embedding, SearchResult};
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Stores the whole batch or nothing. Entries whose chunk id is already
    /// present are skipped; returns how many were added.
    async fn insert(&self, entries: Vec<(Chunk, Embedding)>) -> Result<usize, DomainError>;

    /// At most `top_k` results by descending similarity, ties in insertion order.
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;

    async fn len(&self) -> Result<usize, DomainError>;

    fn dimension(&self) -> usize;
}
