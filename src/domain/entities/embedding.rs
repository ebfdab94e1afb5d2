use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(vec: Vec<f32>) -> Self {
        Self(vec)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Scales to unit length. A zero vector stays zero.
    pub fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            self.0.iter_mut().for_each(|x| *x /= norm);
        }
        self
    }

    /// Cosine similarity; 0.0 for mismatched, empty or zero-norm vectors.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }

        let (norm_a, norm_b) = (self.norm(), other.norm());
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        let dot: f32 = self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum();
        dot / (norm_a * norm_b)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Self(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        let c = Embedding::new(vec![2.0, 0.0]);

        assert!(a.cosine_similarity(&b).abs() < 1e-6);
        assert!((a.cosine_similarity(&c) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalized() {
        let unit = Embedding::new(vec![3.0, 4.0]).normalized();
        assert!((unit.norm() - 1.0).abs() < 1e-6);
        assert_eq!(Embedding::new(vec![0.0; 3]).normalized().norm(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        let a = Embedding::new(vec![1.0, 0.0]);
        assert_eq!(a.cosine_similarity(&Embedding::new(vec![1.0])), 0.0);
        assert_eq!(a.cosine_similarity(&Embedding::new(vec![0.0, 0.0])), 0.0);
    }
}
