use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::application::index::EmbeddingIndex;
use crate::domain::{ports::EmbeddingService, Chunk, Document, DomainError, TextChunker};

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document_id: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
    /// Entries that were not already in the index.
    pub added: usize,
    pub total: usize,
}

/// Chunks extracted document text and feeds it into the shared index.
pub struct IngestionService {
    chunker: TextChunker,
    embedding: Arc<dyn EmbeddingService>,
    embed_timeout: Duration,
    index: RwLock<Option<Arc<EmbeddingIndex>>>,
    /// Text digest of every document id committed to the index.
    fingerprints: RwLock<HashMap<String, [u8; 32]>>,
    ingest_lock: Mutex<()>,
}

fn fingerprint(text: &str) -> [u8; 32] {
    Sha256::digest(text.as_bytes()).into()
}

impl IngestionService {
    pub fn new(
        chunker: TextChunker,
        embedding: Arc<dyn EmbeddingService>,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            chunker,
            embedding,
            embed_timeout,
            index: RwLock::new(None),
            fingerprints: RwLock::new(HashMap::new()),
            ingest_lock: Mutex::new(()),
        }
    }

    /// The index built by the first successful ingestion, if any.
    pub fn index(&self) -> Result<Option<Arc<EmbeddingIndex>>, DomainError> {
        Ok(self
            .index
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .clone())
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn ingest(&self, documents: Vec<Document>) -> Result<IngestReport, DomainError> {
        if documents.iter().any(|d| d.id.trim().is_empty()) {
            return Err(DomainError::invalid_input("document id must not be blank"));
        }

        let _ingesting = self.ingest_lock.lock().await;
        let pending = self.check_immutable(&documents)?;

        let mut reports = Vec::with_capacity(documents.len());
        let mut chunks: Vec<Chunk> = Vec::new();
        for doc in &documents {
            let doc_chunks = self.chunker.chunk(doc);
            reports.push(DocumentReport {
                document_id: doc.id.clone(),
                chunks: doc_chunks.len(),
            });
            chunks.extend(doc_chunks);
        }

        let (added, total) = match self.index()? {
            Some(index) => {
                let added = index.add(&chunks).await?;
                (added, index.len().await?)
            }
            None if chunks.is_empty() => (0, 0),
            None => {
                let index = EmbeddingIndex::build_with_timeout(
                    self.embedding.clone(),
                    &chunks,
                    self.embed_timeout,
                )
                .await?;
                let total = index.len().await?;
                *self
                    .index
                    .write()
                    .map_err(|e| DomainError::internal(e.to_string()))? = Some(Arc::new(index));
                (total, total)
            }
        };

        self.fingerprints
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .extend(pending);

        info!(documents = reports.len(), added, total, "documents ingested");
        Ok(IngestReport {
            documents: reports,
            added,
            total,
        })
    }

    /// Documents are immutable once ingested: a known id must come back with
    /// identical text, including within one batch.
    fn check_immutable(
        &self,
        documents: &[Document],
    ) -> Result<HashMap<String, [u8; 32]>, DomainError> {
        let known = self
            .fingerprints
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut pending: HashMap<String, [u8; 32]> = HashMap::new();
        for doc in documents {
            let digest = fingerprint(&doc.text);
            let previous = pending.get(&doc.id).or_else(|| known.get(&doc.id));
            if previous.is_some_and(|p| *p != digest) {
                return Err(DomainError::invalid_input(format!(
                    "document {:?} was already ingested with different text",
                    doc.id
                )));
            }
            pending.insert(doc.id.clone(), digest);
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChunkingConfig;
    use crate::infrastructure::HashingEmbedding;
    use crate::testing::FailingEmbedding;

    fn service(embedding: Arc<dyn EmbeddingService>) -> IngestionService {
        let chunker = TextChunker::new(ChunkingConfig::new("\n", 30, 5)).unwrap();
        IngestionService::new(chunker, embedding, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_first_ingest_builds_index() {
        let service = service(Arc::new(HashingEmbedding::new(32)));
        assert!(service.index().unwrap().is_none());

        let report = service
            .ingest(vec![
                Document::new("a.txt", "first line of a\nsecond line of a"),
                Document::new("b.txt", "only line of b"),
            ])
            .await
            .unwrap();

        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.documents[1].chunks, 1);
        assert_eq!(report.added, report.total);
        assert!(service.index().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reingest_adds_nothing() {
        let service = service(Arc::new(HashingEmbedding::new(32)));
        let docs = vec![Document::new("a.txt", "alpha beta gamma\ndelta epsilon")];

        let first = service.ingest(docs.clone()).await.unwrap();
        let second = service.ingest(docs).await.unwrap();

        assert_eq!(second.added, 0);
        assert_eq!(second.total, first.total);
    }

    #[tokio::test]
    async fn test_later_ingest_extends_same_index() {
        let service = service(Arc::new(HashingEmbedding::new(32)));
        service
            .ingest(vec![Document::new("a.txt", "alpha beta")])
            .await
            .unwrap();
        let index = service.index().unwrap().unwrap();

        let report = service
            .ingest(vec![Document::new("b.txt", "gamma delta")])
            .await
            .unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(index.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_changed_text_under_known_id_is_rejected() {
        let service = service(Arc::new(HashingEmbedding::new(32)));
        service
            .ingest(vec![Document::new("a", "old stuff\nmore text")])
            .await
            .unwrap();
        let index = service.index().unwrap().unwrap();
        let before = index.len().await.unwrap();

        let result = service
            .ingest(vec![Document::new("a", "new stuff\nmore text")])
            .await;

        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert_eq!(index.len().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_conflicting_ids_in_one_batch_are_rejected() {
        let service = service(Arc::new(HashingEmbedding::new(32)));
        let result = service
            .ingest(vec![
                Document::new("a", "first version"),
                Document::new("a", "second version"),
            ])
            .await;

        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert!(service.index().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_ingest_does_not_claim_the_id() {
        let service = service(Arc::new(FailingEmbedding::new(32)));
        let _ = service.ingest(vec![Document::new("a", "old text")]).await;

        let result = service.ingest(vec![Document::new("a", "new text")]).await;
        assert!(matches!(result, Err(DomainError::EmbeddingService(_))));
    }

    #[tokio::test]
    async fn test_blank_document_id_is_rejected() {
        let service = service(Arc::new(HashingEmbedding::new(32)));
        let result = service.ingest(vec![Document::new(" ", "text")]).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_failed_build_leaves_no_index() {
        let service = service(Arc::new(FailingEmbedding::new(32)));
        let result = service
            .ingest(vec![Document::new("a.txt", "some text")])
            .await;

        assert!(matches!(result, Err(DomainError::EmbeddingService(_))));
        assert!(service.index().unwrap().is_none());
    }
}
