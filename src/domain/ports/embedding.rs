use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;

    /// Embeds every text, preserving input order. Fails if any text fails.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        futures::future::try_join_all(texts.iter().map(|text| self.embed(text))).await
    }

    fn dimension(&self) -> usize;
}
