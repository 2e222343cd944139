//! Embedding generation behind the `Embedder` trait

use crate::error::{Result, ResumeRankerError};
use log::debug;
use model2vec_rs::model::StaticModel;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::path::Path;
use std::time::Instant;
use twox_hash::XxHash64;

/// Fixed-length vector produced by an embedding model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn zeros(dimension: usize) -> Self {
        Self(vec![0.0; dimension])
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn magnitude(&self) -> f64 {
        self.0
            .iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt()
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Maps texts to vectors, one per input and in input order.
pub trait Embedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>>;

    /// Stable identifier of the underlying model
    fn model_name(&self) -> &str;

    /// Output dimensionality when known before the first call
    fn dimension(&self) -> Option<usize>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        (**self).embed(texts)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }
}

/// Model2Vec static embeddings
pub struct StaticEmbedder {
    model: StaticModel,
    model_name: String,
}

impl StaticEmbedder {
    pub fn load(model_path: &Path, model_name: &str) -> Result<Self> {
        let start_time = Instant::now();

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .map_err(|e| {
            ResumeRankerError::ModelUnavailable(format!(
                "Failed to load Model2Vec model '{}' from {}: {}",
                model_name,
                model_path.display(),
                e
            ))
        })?;

        debug!("Model2Vec model {} loaded in {:.2?}", model_name, start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_name.to_string(),
        })
    }
}

impl Embedder for StaticEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        Ok(self
            .model
            .encode(texts)
            .into_iter()
            .map(EmbeddingVector::from)
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// Hashed bag-of-words vectors. Needs no model files, so it works offline and
/// gives reproducible vectors for tests.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub const MODEL_NAME: &'static str = "hashing";

    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(ResumeRankerError::InvalidInput(
                "Hashing embedder dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn embed_one(&self, text: &str) -> EmbeddingVector {
        let mut values = vec![0f32; self.dimension];

        for token in text.split_whitespace() {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            values[bucket] += 1.0;
        }

        // Empty text stays a zero vector
        let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut values {
                *value /= norm;
            }
        }

        EmbeddingVector::new(values)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
