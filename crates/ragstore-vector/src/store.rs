//! In-memory vector store with exact brute-force nearest-neighbor search.
//!
//! Every query scores the full entry set, so search is O(n·d). That is the
//! intended trade-off for the collection sizes this store serves.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use ragstore_core::config::{KeyStrategy, RagstoreConfig};
use ragstore_core::error::{Result, StoreError};

use crate::distance::{DistanceMetric, Polarity};
use crate::document::{Document, Metadata};
use crate::embedding::{DynEmbeddingProvider, EmbeddingProvider};

/// Metadata field that holds the source text under [`KeyStrategy::Generated`].
pub const TEXT_METADATA_FIELD: &str = "text";

/// A stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

/// A ranked key without metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredKey {
    pub key: String,
    /// Similarity for cosine, distance for Euclidean.
    pub score: f64,
}

/// A ranked key with the metadata stored alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub key: String,
    pub score: f64,
    pub metadata: Metadata,
}

/// Result of [`VectorStore::search`], shaped by whether metadata was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchResults {
    /// Returned when metadata was not requested.
    Scored(Vec<ScoredKey>),
    /// Returned when metadata was requested.
    WithMetadata(Vec<SearchHit>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Scored(hits) => hits.len(),
            SearchResults::WithMetadata(hits) => hits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in rank order.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            SearchResults::Scored(hits) => hits.iter().map(|h| h.key.as_str()).collect(),
            SearchResults::WithMetadata(hits) => hits.iter().map(|h| h.key.as_str()).collect(),
        }
    }

    /// Scores in rank order.
    pub fn scores(&self) -> Vec<f64> {
        match self {
            SearchResults::Scored(hits) => hits.iter().map(|h| h.score).collect(),
            SearchResults::WithMetadata(hits) => hits.iter().map(|h| h.score).collect(),
        }
    }

    /// Drop metadata, if any, and return plain ranked keys.
    pub fn into_scored(self) -> Vec<ScoredKey> {
        match self {
            SearchResults::Scored(hits) => hits,
            SearchResults::WithMetadata(hits) => hits
                .into_iter()
                .map(|h| ScoredKey {
                    key: h.key,
                    score: h.score,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    /// Entries in insertion order. An overwrite keeps the original slot.
    entries: Vec<Entry>,
    positions: HashMap<String, usize>,
    dimension: Option<usize>,
}

impl StoreState {
    fn check_dimension(&self, actual: usize) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(StoreError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

fn validate_vector(vector: &[f32]) -> Result<()> {
    if vector.is_empty() {
        return Err(StoreError::InvalidVector("vector is empty".to_string()));
    }
    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(StoreError::InvalidVector(format!(
            "component {} is not finite",
            pos
        )));
    }
    Ok(())
}

/// Reject unusable vectors coming back from a provider as a provider failure.
fn validate_provider_vector(index: usize, vector: &[f32]) -> Result<()> {
    validate_vector(vector).map_err(|e| {
        StoreError::EmbeddingProvider(format!("malformed embedding at index {}: {}", index, e))
    })
}

/// In-memory vector store keyed by string.
///
/// Thread-safe via an interior `RwLock`: searches and lookups share the read
/// guard, insertions and removals take the write guard. Cloning the store
/// yields another handle to the same entries.
#[derive(Clone)]
pub struct VectorStore {
    state: Arc<RwLock<StoreState>>,
    metric: DistanceMetric,
    key_strategy: KeyStrategy,
    embedder: Option<Arc<dyn DynEmbeddingProvider>>,
}

impl fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorStore")
            .field("metric", &self.metric)
            .field("key_strategy", &self.key_strategy)
            .field("len", &self.len())
            .field("dimension", &self.dimension())
            .field("has_embedder", &self.embedder.is_some())
            .finish()
    }
}

impl VectorStore {
    /// Create an empty store. The first insertion fixes the dimension.
    pub fn new(metric: DistanceMetric) -> Self {
        Self::from_state(metric, StoreState::default())
    }

    /// Create an empty store whose dimension is fixed up front.
    pub fn with_dimension(metric: DistanceMetric, dimension: usize) -> Self {
        Self::from_state(
            metric,
            StoreState {
                dimension: Some(dimension),
                ..StoreState::default()
            },
        )
    }

    /// Create an empty store from a metric name such as `"cosine"`.
    pub fn with_metric_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    /// Create an empty store from configuration. No embedding provider is
    /// attached; use [`with_embedder`](Self::with_embedder).
    pub fn from_config(config: &RagstoreConfig) -> Result<Self> {
        config.validate()?;
        let metric: DistanceMetric = config.store.metric.parse()?;
        let store = match config.store.dimension {
            Some(dimension) => Self::with_dimension(metric, dimension),
            None => Self::new(metric),
        };
        Ok(store.with_key_strategy(config.store.key_strategy))
    }

    fn from_state(metric: DistanceMetric, state: StoreState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            metric,
            key_strategy: KeyStrategy::default(),
            embedder: None,
        }
    }

    /// Attach the embedding provider used by text search and bulk builds.
    ///
    /// A store without a dimension adopts the provider's. A store whose
    /// dimension is already fixed rejects a provider that disagrees.
    pub fn with_embedder(self, embedder: impl EmbeddingProvider + 'static) -> Result<Self> {
        self.with_dyn_embedder(Arc::new(embedder))
    }

    /// Attach an already type-erased embedding provider.
    pub fn with_dyn_embedder(mut self, embedder: Arc<dyn DynEmbeddingProvider>) -> Result<Self> {
        let provided = embedder.dimensions();
        if provided == 0 {
            return Err(StoreError::EmbeddingProvider(
                "provider reports zero dimensions".to_string(),
            ));
        }
        {
            let mut state = self.write()?;
            match state.dimension {
                Some(expected) if expected != provided => {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        actual: provided,
                    });
                }
                Some(_) => {}
                None => {
                    debug!(dimension = provided, "Store dimension taken from provider");
                    state.dimension = Some(provided);
                }
            }
        }
        self.embedder = Some(embedder);
        Ok(self)
    }

    pub fn with_key_strategy(mut self, key_strategy: KeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn provider(&self) -> Result<&Arc<dyn DynEmbeddingProvider>> {
        self.embedder.as_ref().ok_or(StoreError::NoEmbeddingProvider)
    }

    /// Insert a vector under `key`, overwriting any existing entry.
    ///
    /// Missing metadata is stored as an empty map. Fails without touching
    /// the store if the vector is empty, non-finite, or of the wrong
    /// dimension.
    pub fn insert(
        &self,
        key: impl Into<String>,
        vector: Vec<f32>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        validate_vector(&vector)?;
        let key = key.into();
        let metadata = metadata.unwrap_or_default();

        let mut state = self.write()?;
        state.check_dimension(vector.len())?;
        if state.dimension.is_none() {
            debug!(dimension = vector.len(), "Store dimension established");
            state.dimension = Some(vector.len());
        }

        let existing = state.positions.get(&key).copied();
        match existing {
            Some(pos) => {
                let entry = &mut state.entries[pos];
                entry.vector = vector;
                entry.metadata = metadata;
            }
            None => {
                let pos = state.entries.len();
                state.positions.insert(key.clone(), pos);
                state.entries.push(Entry {
                    key,
                    vector,
                    metadata,
                });
            }
        }
        Ok(())
    }

    /// Insert a vector with empty metadata.
    pub fn insert_vector(&self, key: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        self.insert(key, vector, None)
    }

    /// Score every entry against `query` and return the `k` best positions.
    ///
    /// Equal scores keep insertion order.
    fn rank(&self, state: &StoreState, query: &[f32], k: usize) -> Result<Vec<(usize, f64)>> {
        validate_vector(query)?;
        state.check_dimension(query.len())?;
        if k == 0 || state.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f64)> = state
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, self.metric.score(query, &entry.vector)))
            .collect();

        match self.metric.polarity() {
            Polarity::HigherIsCloser => scored.sort_by(|a, b| b.1.total_cmp(&a.1)),
            Polarity::LowerIsCloser => scored.sort_by(|a, b| a.1.total_cmp(&b.1)),
        }
        scored.truncate(k);

        debug!(
            metric = %self.metric,
            candidates = state.entries.len(),
            k,
            returned = scored.len(),
            "Vector search complete"
        );
        Ok(scored)
    }

    /// Return the `k` nearest keys with their scores.
    pub fn search_scored(&self, query: &[f32], k: usize) -> Result<Vec<ScoredKey>> {
        let state = self.read()?;
        Ok(self
            .rank(&state, query, k)?
            .into_iter()
            .map(|(pos, score)| ScoredKey {
                key: state.entries[pos].key.clone(),
                score,
            })
            .collect())
    }

    /// Return the `k` nearest keys with their scores and metadata.
    pub fn search_with_metadata(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let state = self.read()?;
        Ok(self
            .rank(&state, query, k)?
            .into_iter()
            .map(|(pos, score)| {
                let entry = &state.entries[pos];
                SearchHit {
                    key: entry.key.clone(),
                    score,
                    metadata: entry.metadata.clone(),
                }
            })
            .collect())
    }

    /// Return the `k` nearest entries to `query`.
    ///
    /// Cosine ranks by descending similarity, Euclidean by ascending
    /// distance. `k == 0` yields no results and a `k` beyond the entry count
    /// yields every entry.
    pub fn search(&self, query: &[f32], k: usize, include_metadata: bool) -> Result<SearchResults> {
        if include_metadata {
            self.search_with_metadata(query, k)
                .map(SearchResults::WithMetadata)
        } else {
            self.search_scored(query, k).map(SearchResults::Scored)
        }
    }

    /// Embed `query` with the attached provider and search with the result.
    pub async fn search_by_text(
        &self,
        query: &str,
        k: usize,
        include_metadata: bool,
    ) -> Result<SearchResults> {
        let provider = self.provider()?;
        let vector = provider.embed_one_boxed(query).await?;
        validate_provider_vector(0, &vector)?;
        self.search(&vector, k, include_metadata)
    }

    /// Look up an entry by key. `None` means the key was never inserted.
    pub fn retrieve(&self, key: &str) -> Result<Option<Entry>> {
        let state = self.read()?;
        Ok(state
            .positions
            .get(key)
            .map(|&pos| state.entries[pos].clone()))
    }

    /// Remove an entry, returning it if it existed.
    ///
    /// The established dimension is kept even when the store becomes empty.
    pub fn remove(&self, key: &str) -> Result<Option<Entry>> {
        let mut state = self.write()?;
        let Some(pos) = state.positions.remove(key) else {
            return Ok(None);
        };
        let entry = state.entries.remove(pos);
        for slot in state.positions.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Ok(Some(entry))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read()
            .map(|s| s.positions.contains_key(key))
            .unwrap_or(false)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.read()
            .map(|s| s.entries.iter().map(|e| e.key.clone()).collect())
            .unwrap_or_default()
    }

    /// Dimension shared by all vectors, once established.
    pub fn dimension(&self) -> Option<usize> {
        self.read().ok().and_then(|s| s.dimension)
    }

    /// Return the number of entries currently stored.
    pub fn len(&self) -> usize {
        self.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embed and insert a collection of documents, returning the store.
    ///
    /// See [`extend_from_collection`](Self::extend_from_collection) for the
    /// failure semantics. On error this handle is dropped, but entries
    /// written before the failure remain visible through any clone taken
    /// beforehand.
    pub async fn build_from_collection<I, D>(self, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<Document>,
    {
        self.extend_from_collection(items).await?;
        Ok(self)
    }

    /// Embed and insert a collection of documents, returning how many were
    /// written.
    ///
    /// All texts go to the provider in a single `embed_many` call. An empty
    /// collection is a no-op. If the provider returns the wrong number of
    /// vectors, or any vector that is empty or non-finite, nothing is inserted
    /// and the failure is reported as a provider error. Insertion itself is
    /// not transactional:
    /// when document `i` fails validation, documents before `i` stay in the
    /// store and the error is returned.
    pub async fn extend_from_collection<I, D>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = D>,
        D: Into<Document>,
    {
        let documents: Vec<Document> = items.into_iter().map(Into::into).collect();
        if documents.is_empty() {
            return Ok(0);
        }

        let provider = self.provider()?;
        let (texts, metadata): (Vec<String>, Vec<Metadata>) = documents
            .into_iter()
            .map(|doc| (doc.text, doc.metadata))
            .unzip();

        let vectors = provider.embed_many_boxed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(StoreError::EmbeddingCountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        for (index, vector) in vectors.iter().enumerate() {
            validate_provider_vector(index, vector)?;
        }

        let mut written = 0;
        for ((text, vector), metadata) in texts.into_iter().zip(vectors).zip(metadata) {
            let (key, metadata) = self.assign_key(text, metadata);
            self.insert(key, vector, Some(metadata))?;
            written += 1;
        }

        info!(
            written,
            total = self.len(),
            key_strategy = ?self.key_strategy,
            "Collection ingested"
        );
        Ok(written)
    }

    fn assign_key(&self, text: String, mut metadata: Metadata) -> (String, Metadata) {
        match self.key_strategy {
            KeyStrategy::Text => (text, metadata),
            KeyStrategy::Generated => {
                metadata.insert(
                    TEXT_METADATA_FIELD.to_string(),
                    serde_json::Value::String(text),
                );
                (Uuid::new_v4().to_string(), metadata)
            }
        }
    }
}
