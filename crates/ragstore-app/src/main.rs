//! ragstore demo binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Build a vector store with the configured metric and a mock provider
//! 3. Ingest a small sample corpus in one batch
//! 4. Run a text query and print the ranked hits

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use ragstore_core::config::RagstoreConfig;
use ragstore_core::error::{Result, StoreError};
use ragstore_vector::{Document, Metadata, MockEmbedding, SearchResults, VectorStore};

const SAMPLE_CORPUS: &[&str] = &[
    "I like to eat broccoli and bananas.",
    "I ate a banana and spinach smoothie for breakfast.",
    "Chinchillas and kittens are cute.",
    "My sister adopted a kitten yesterday.",
    "Look at this cute hamster munching on a piece of broccoli.",
];

#[derive(Debug, Parser)]
#[command(name = "ragstore", version, about = "Query an in-memory vector store")]
struct Cli {
    /// Path to a TOML config file (defaults to RAGSTORE_CONFIG or ~/.ragstore/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of results to return (defaults to store.default_k).
    #[arg(short, long)]
    k: Option<usize>,

    /// Print stored metadata with each hit.
    #[arg(long)]
    metadata: bool,

    /// Key to look up after the search.
    #[arg(long)]
    retrieve: Option<String>,

    /// Query text.
    #[arg(default_value = "I think fruit is awesome!")]
    query: String,
}

/// Resolve the config file path (RAGSTORE_CONFIG env, or ~/.ragstore/config.toml).
fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("RAGSTORE_CONFIG") {
        return PathBuf::from(p);
    }
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".ragstore").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".ragstore").join("config.toml");
    }
    PathBuf::from("config.toml")
}

fn sample_documents() -> Vec<Document> {
    SAMPLE_CORPUS
        .iter()
        .enumerate()
        .map(|(line, text)| {
            let metadata = json!({ "source": "sample", "line": line });
            Document::new(*text, metadata.as_object().cloned().unwrap_or_default())
        })
        .collect()
}

fn render_metadata(metadata: &Metadata) -> Result<String> {
    Ok(serde_json::to_string(metadata)?)
}

fn print_results(results: &SearchResults) -> Result<()> {
    match results {
        SearchResults::Scored(hits) => {
            for (rank, hit) in hits.iter().enumerate() {
                println!("{:>2}. {:.4}  {}", rank + 1, hit.score, hit.key);
            }
        }
        SearchResults::WithMetadata(hits) => {
            for (rank, hit) in hits.iter().enumerate() {
                println!(
                    "{:>2}. {:.4}  {}  {}",
                    rank + 1,
                    hit.score,
                    hit.key,
                    render_metadata(&hit.metadata)?
                );
            }
        }
    }
    Ok(())
}

async fn run(cli: Cli, config: RagstoreConfig) -> Result<()> {
    if config.embedding.provider != "mock" {
        return Err(StoreError::Config(format!(
            "unsupported embedding provider: {}",
            config.embedding.provider
        )));
    }

    let store = VectorStore::from_config(&config)?
        .with_embedder(MockEmbedding::with_dimensions(config.embedding.dimensions))?
        .build_from_collection(sample_documents())
        .await?;
    tracing::info!(
        entries = store.len(),
        metric = %store.metric(),
        "Vector store ready"
    );

    let k = cli.k.unwrap_or(config.store.default_k);
    let results = store.search_by_text(&cli.query, k, cli.metadata).await?;
    println!("Closest {} entries to {:?}:", results.len(), cli.query);
    print_results(&results)?;

    if let Some(key) = cli.retrieve {
        match store.retrieve(&key)? {
            Some(entry) => println!(
                "Retrieved {:?}: {} dims, metadata {}",
                entry.key,
                entry.vector.len(),
                render_metadata(&entry.metadata)?
            ),
            None => println!("No entry stored under {:?}", key),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let config = RagstoreConfig::load_or_default(&config_file);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting ragstore v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    run(cli, config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["ragstore"]);
        assert_eq!(cli.query, "I think fruit is awesome!");
        assert!(cli.k.is_none());
        assert!(!cli.metadata);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["ragstore", "-k", "2", "--metadata", "kittens"]);
        assert_eq!(cli.k, Some(2));
        assert!(cli.metadata);
        assert_eq!(cli.query, "kittens");
    }

    #[test]
    fn test_sample_documents_carry_metadata() {
        let docs = sample_documents();
        assert_eq!(docs.len(), SAMPLE_CORPUS.len());
        assert_eq!(docs[3].metadata["line"], 3);
    }

    #[test]
    fn test_render_metadata() {
        let docs = sample_documents();
        let rendered = render_metadata(&docs[1].metadata).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, json!({ "source": "sample", "line": 1 }));
    }

    #[tokio::test]
    async fn test_run_with_metadata() {
        let cli = Cli::parse_from(["ragstore", "--metadata", "-k", "2", "kittens"]);
        run(cli, RagstoreConfig::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_with_defaults() {
        let cli = Cli::parse_from([
            "ragstore",
            "--retrieve",
            "I like to eat broccoli and bananas.",
        ]);
        run(cli, RagstoreConfig::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_rejects_unknown_provider() {
        let mut config = RagstoreConfig::default();
        config.embedding.provider = "openai".to_string();
        let err = run(Cli::parse_from(["ragstore"]), config).await.unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
