use thiserror::Error;

/// Error type shared by every ragstore crate.
///
/// "Not found" is deliberately absent: lookups return `Option` and an absent
/// key is an ordinary outcome, not a failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Embedding count mismatch: sent {expected} texts, received {actual} vectors")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("No embedding provider configured")]
    NoEmbeddingProvider,

    #[error("Unknown distance metric: {0}")]
    InvalidMetric(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// True for failures that originate in the embedding provider,
    /// including a batch that came back with the wrong number of vectors.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            StoreError::EmbeddingProvider(_) | StoreError::EmbeddingCountMismatch { .. }
        )
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for ragstore operations.
pub type Result<T> = std::result::Result<T, StoreError>;
