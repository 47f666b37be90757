//! Embedding provider capability and a deterministic mock implementation.
//!
//! The store never computes embeddings itself. It asks an
//! [`EmbeddingProvider`] for one vector per text, either one at a time
//! (queries) or as a batch (bulk ingestion).

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;

use ragstore_core::error::{Result, StoreError};

/// Default dimensionality of [`MockEmbedding`] vectors.
pub const DEFAULT_MOCK_DIMENSIONS: usize = 384;

/// Service that turns text into fixed-dimension vectors.
///
/// `embed_many` must return exactly one vector per input, in input order.
/// The default implementation embeds texts one by one; providers with a
/// native batch endpoint should override it.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    fn embed_one(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;

    /// Embed many texts in one call.
    fn embed_many(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send {
        async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed_one(text).await?);
            }
            Ok(vectors)
        }
    }

    /// Dimensionality of the vectors this provider produces.
    fn dimensions(&self) -> usize;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`EmbeddingProvider`] for dynamic dispatch.
///
/// `EmbeddingProvider` returns `impl Future` and therefore cannot be used as
/// a trait object. This trait boxes the futures instead so a store can hold
/// `Arc<dyn DynEmbeddingProvider>` without a generic parameter. Every
/// `EmbeddingProvider` implements it through the blanket impl below.
pub trait DynEmbeddingProvider: Send + Sync {
    fn embed_one_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>>;

    fn embed_many_boxed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingProvider> DynEmbeddingProvider for T {
    fn embed_one_boxed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
        Box::pin(self.embed_one(text))
    }

    fn embed_many_boxed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
        Box::pin(self.embed_many(texts))
    }

    fn dimensions(&self) -> usize {
        EmbeddingProvider::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock provider that derives unit vectors from a hash of the input text.
///
/// Identical inputs always produce identical outputs, which is enough to
/// exercise ingestion and search without a real model.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_MOCK_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingProvider for MockEmbedding {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(StoreError::EmbeddingProvider(
                "Cannot embed empty text".to_string(),
            ));
        }
        Ok(self.hash_to_vector(text))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if let Some(pos) = texts.iter().position(|t| t.is_empty()) {
            return Err(StoreError::EmbeddingProvider(format!(
                "Cannot embed empty text at index {}",
                pos
            )));
        }
        Ok(texts.iter().map(|t| self.hash_to_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
