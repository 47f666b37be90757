use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, StoreError};

/// Top-level configuration for ragstore.
///
/// Loaded from `~/.ragstore/config.toml` by default. Every section is
/// optional and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagstoreConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl RagstoreConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RagstoreConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or is invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check numeric bounds. The metric name is checked when a store is
    /// built from this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.store.default_k == 0 {
            return Err(StoreError::Config(
                "store.default_k must be greater than zero".to_string(),
            ));
        }
        if self.store.dimension == Some(0) {
            return Err(StoreError::Config(
                "store.dimension must be greater than zero".to_string(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(StoreError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        if let Some(dim) = self.store.dimension {
            if dim != self.embedding.dimensions {
                return Err(StoreError::Config(format!(
                    "store.dimension ({}) disagrees with embedding.dimensions ({})",
                    dim, self.embedding.dimensions
                )));
            }
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// How bulk ingestion assigns keys to documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// The document text is the key. Identical texts collapse into one entry.
    #[default]
    Text,
    /// Each document gets a fresh UUID key and its text is kept in the
    /// metadata under `"text"`.
    Generated,
}

/// Vector store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Distance metric name: "cosine" or "euclidean".
    pub metric: String,
    /// Fixed vector dimension. When unset the first insertion decides.
    pub dimension: Option<usize>,
    /// Key assignment for bulk ingestion.
    pub key_strategy: KeyStrategy,
    /// Default number of results for text queries.
    pub default_k: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            metric: "cosine".to_string(),
            dimension: None,
            key_strategy: KeyStrategy::Text,
            default_k: 4,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name. Only "mock" ships with this workspace.
    pub provider: String,
    /// Dimension of the vectors the provider produces.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            dimensions: 384,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RagstoreConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.store.metric, "cosine");
        assert_eq!(config.store.dimension, None);
        assert_eq!(config.store.key_strategy, KeyStrategy::Text);
        assert_eq!(config.store.default_k, 4);
        assert_eq!(config.embedding.provider, "mock");
        assert_eq!(config.embedding.dimensions, 384);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[store]
metric = "euclidean"
key_strategy = "generated"
"#;
        let config: RagstoreConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.metric, "euclidean");
        assert_eq!(config.store.key_strategy, KeyStrategy::Generated);
        assert_eq!(config.store.default_k, 4);
        assert_eq!(config.embedding.dimensions, 384);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = RagstoreConfig::default();
        config.store.metric = "euclidean".to_string();
        config.store.dimension = Some(8);
        config.embedding.dimensions = 8;
        config.save(&path).unwrap();

        let loaded = RagstoreConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let result = RagstoreConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "store = [[[").unwrap();
        let config = RagstoreConfig::load_or_default(&path);
        assert_eq!(config, RagstoreConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_k() {
        let mut config = RagstoreConfig::default();
        config.store.default_k = 0;
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_dimension_disagreement() {
        let mut config = RagstoreConfig::default();
        config.store.dimension = Some(4);
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));

        config.embedding.dimensions = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[embedding]\ndimensions = 0\n").unwrap();
        assert!(matches!(
            RagstoreConfig::load(&path),
            Err(StoreError::Config(_))
        ));
    }
}
