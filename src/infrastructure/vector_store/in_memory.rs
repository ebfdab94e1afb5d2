use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;
use uuid::Uuid;

use crate::domain::{ports::VectorStore, Chunk, DomainError, Embedding, SearchResult};

#[derive(Default)]
struct Entries {
    items: Vec<(Chunk, Embedding)>,
    ids: HashSet<Uuid>,
}

/// Exhaustive cosine search over entries kept in ingestion order.
pub struct InMemoryVectorStore {
    entries: RwLock<Entries>,
    dimension: usize,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            dimension,
        }
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<(), DomainError> {
        if embedding.dimension() != self.dimension {
            return Err(DomainError::embedding(format!(
                "expected {}-dimensional vector, got {}",
                self.dimension,
                embedding.dimension()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert(&self, entries: Vec<(Chunk, Embedding)>) -> Result<usize, DomainError> {
        for (_, embedding) in &entries {
            self.check_dimension(embedding)?;
        }

        let mut store = self
            .entries
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut added = 0;
        for (chunk, embedding) in entries {
            if store.ids.insert(chunk.id) {
                store.items.push((chunk, embedding));
                added += 1;
            }
        }
        Ok(added)
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.check_dimension(query)?;

        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut results: Vec<SearchResult> = store
            .items
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        // Stable sort: equal scores keep ingestion order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        Ok(results)
    }

    async fn len(&self) -> Result<usize, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(store.items.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
