//! Normalized input for bulk ingestion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open string-keyed metadata attached to an entry.
pub type Metadata = Map<String, Value>;

/// A piece of text with the metadata it should be stored under.
///
/// Plain strings convert with empty metadata, so callers can pass either
/// bare texts or `(text, metadata)` pairs to
/// [`VectorStore::build_from_collection`](crate::VectorStore::build_from_collection).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self::new(text, Metadata::new())
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text, Metadata::new())
    }
}

impl From<(String, Metadata)> for Document {
    fn from((text, metadata): (String, Metadata)) -> Self {
        Self::new(text, metadata)
    }
}

impl From<(&str, Metadata)> for Document {
    fn from((text, metadata): (&str, Metadata)) -> Self {
        Self::new(text, metadata)
    }
}
