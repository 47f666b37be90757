//! ragstore vector crate - distance metrics, embedding provider capability,
//! and the in-memory vector store.
//!
//! The store performs an exact linear scan over every entry on each query,
//! ranking by cosine similarity or Euclidean distance.

pub mod distance;
pub mod document;
pub mod embedding;
pub mod store;

pub use distance::{cosine_similarity, euclidean_distance, DistanceMetric, Polarity};
pub use document::{Document, Metadata};
pub use embedding::{DynEmbeddingProvider, EmbeddingProvider, MockEmbedding};
pub use store::{Entry, ScoredKey, SearchHit, SearchResults, VectorStore, TEXT_METADATA_FIELD};

pub use ragstore_core::config::KeyStrategy;
pub use ragstore_core::{Result, StoreError};
