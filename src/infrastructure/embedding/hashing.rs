use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};

/// Offline bag-of-words embedding using signed feature hashing.
///
/// Lowercased alphanumeric tokens are hashed into `dimension` buckets and the
/// result is L2-normalized, so texts sharing words score higher under cosine
/// similarity. Useful without network access and in tests.
pub struct HashingEmbedding {
    dimension: usize,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let slot = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }

        Embedding::new(vector).normalized()
    }
}

#[async_trait]
impl EmbeddingService for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        if self.dimension == 0 {
            return Err(DomainError::embedding("hashing dimension must be positive"));
        }
        Ok(self.vectorize(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
