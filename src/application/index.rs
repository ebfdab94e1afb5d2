use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    Chunk, DomainError, Embedding, SearchResult,
};
use crate::infrastructure::InMemoryVectorStore;

const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Similarity index over document chunks.
///
/// The same embedding service is used for ingestion and queries, so stored
/// vectors and query vectors always live in the same space. Writers are
/// serialized; queries only take the store's read lock.
pub struct EmbeddingIndex {
    embedding: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
    writer: Mutex<()>,
    embed_timeout: Duration,
}

impl EmbeddingIndex {
    pub fn with_store(embedding: Arc<dyn EmbeddingService>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedding,
            store,
            writer: Mutex::new(()),
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Embeds `chunks` into a fresh in-memory index.
    pub async fn build(
        embedding: Arc<dyn EmbeddingService>,
        chunks: &[Chunk],
    ) -> Result<Self, DomainError> {
        Self::build_with_timeout(embedding, chunks, DEFAULT_EMBED_TIMEOUT).await
    }

    #[instrument(skip(embedding, chunks), fields(count = chunks.len()))]
    pub async fn build_with_timeout(
        embedding: Arc<dyn EmbeddingService>,
        chunks: &[Chunk],
        embed_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let store = Arc::new(InMemoryVectorStore::new(embedding.dimension()));
        let index = Self::with_store(embedding, store).with_embed_timeout(embed_timeout);
        index.add(chunks).await?;
        Ok(index)
    }

    /// Adds chunks without touching existing entries; returns how many were new.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn add(&self, chunks: &[Chunk]) -> Result<usize, DomainError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let _writer = self.writer.lock().await;

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = tokio::time::timeout(self.embed_timeout, self.embedding.embed_batch(&texts))
            .await
            .map_err(|_| DomainError::timeout("embedding chunks timed out"))??;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks.iter().cloned().zip(embeddings).collect();
        let added = self.store.insert(entries).await?;

        info!(added, skipped = chunks.len() - added, "chunks indexed");
        Ok(added)
    }

    /// The `top_k` chunks most similar to `text`.
    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        if top_k == 0 {
            return Err(DomainError::invalid_config("top_k must be greater than 0"));
        }
        if self.is_empty().await? {
            return Ok(Vec::new());
        }

        let embedding = tokio::time::timeout(self.embed_timeout, self.embedding.embed(text))
            .await
            .map_err(|_| DomainError::timeout("embedding query timed out"))??;
        self.query_embedding(&embedding, top_k).await
    }

    pub async fn query_embedding(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        if top_k == 0 {
            return Err(DomainError::invalid_config("top_k must be greater than 0"));
        }
        self.store.search(embedding, top_k).await
    }

    pub async fn len(&self) -> Result<usize, DomainError> {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.store.len().await? == 0)
    }

    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{chunk_text, ChunkingConfig};
    use crate::infrastructure::HashingEmbedding;
    use crate::testing::{FailingEmbedding, SlowEmbedding};

    fn corpus() -> Vec<Chunk> {
        let text = "Rust guarantees memory safety.\n\
                    Tokio is an async runtime.\n\
                    Serde serializes data structures.\n\
                    Axum is a web framework.";
        chunk_text("notes.txt", text, &ChunkingConfig::new("\n", 40, 0)).unwrap()
    }

    fn embedding() -> Arc<dyn EmbeddingService> {
        Arc::new(HashingEmbedding::new(256))
    }

    #[tokio::test]
    async fn test_build_then_query_returns_every_chunk_once() {
        let chunks = corpus();
        let index = EmbeddingIndex::build(embedding(), &chunks).await.unwrap();

        let results = index.query("anything", chunks.len()).await.unwrap();
        let mut ids: Vec<_> = results.iter().map(|r| r.chunk.id).collect();
        ids.sort();
        let mut expected: Vec<_> = chunks.iter().map(|c| c.id).collect();
        expected.sort();

        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_query_ranks_relevant_chunk_first() {
        let index = EmbeddingIndex::build(embedding(), &corpus()).await.unwrap();

        let results = index.query("tokio async runtime", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].chunk.content.contains("Tokio"));
    }

    #[tokio::test]
    async fn test_query_is_stable() {
        let index = EmbeddingIndex::build(embedding(), &corpus()).await.unwrap();

        let first = index.query("web framework data", 3).await.unwrap();
        let second = index.query("web framework data", 3).await.unwrap();
        let ids = |r: &[SearchResult]| r.iter().map(|x| x.chunk.id).collect::<Vec<_>>();

        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn test_query_rejects_zero_k() {
        let index = EmbeddingIndex::build(embedding(), &corpus()).await.unwrap();
        let result = index.query("rust", 0).await;
        assert!(matches!(result, Err(DomainError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_query_empty_index() {
        let index = EmbeddingIndex::build(Arc::new(FailingEmbedding::new(8)), &[])
            .await
            .unwrap();
        assert!(index.query("rust", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_is_all_or_nothing() {
        let result = EmbeddingIndex::build(Arc::new(FailingEmbedding::new(8)), &corpus()).await;
        assert!(matches!(result, Err(DomainError::EmbeddingService(_))));
    }

    #[tokio::test]
    async fn test_failed_add_keeps_existing_entries() {
        let chunks = corpus();
        let store = Arc::new(InMemoryVectorStore::new(8));
        let good = EmbeddingIndex::with_store(Arc::new(HashingEmbedding::new(8)), store.clone());
        good.add(&chunks[..2]).await.unwrap();

        let bad = EmbeddingIndex::with_store(Arc::new(FailingEmbedding::new(8)), store.clone());
        assert!(bad.add(&chunks[2..]).await.is_err());
        assert_eq!(good.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_add_skips_reingested_chunks() {
        let chunks = corpus();
        let index = EmbeddingIndex::build(embedding(), &chunks).await.unwrap();

        assert_eq!(index.add(&chunks).await.unwrap(), 0);
        assert_eq!(index.len().await.unwrap(), chunks.len());
    }

    #[tokio::test]
    async fn test_add_times_out() {
        let index = EmbeddingIndex::with_store(
            Arc::new(SlowEmbedding::new(8, Duration::from_millis(200))),
            Arc::new(InMemoryVectorStore::new(8)),
        )
        .with_embed_timeout(Duration::from_millis(10));

        let result = index.add(&corpus()).await;
        assert!(matches!(result, Err(DomainError::Timeout(_))));
        assert!(index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_query_times_out() {
        let store = Arc::new(InMemoryVectorStore::new(8));
        EmbeddingIndex::with_store(Arc::new(HashingEmbedding::new(8)), store.clone())
            .add(&corpus())
            .await
            .unwrap();

        let slow = EmbeddingIndex::with_store(
            Arc::new(SlowEmbedding::new(8, Duration::from_millis(200))),
            store,
        )
        .with_embed_timeout(Duration::from_millis(10));

        let result = slow.query("tokio", 2).await;
        assert!(matches!(result, Err(DomainError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_concurrent_queries() {
        let index = Arc::new(EmbeddingIndex::build(embedding(), &corpus()).await.unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = index.clone();
                tokio::spawn(async move { index.query("serde data structures", 1).await })
            })
            .collect();

        for handle in handles {
            let results = handle.await.unwrap().unwrap();
            assert!(results[0].chunk.content.contains("Serde"));
        }
    }
}
