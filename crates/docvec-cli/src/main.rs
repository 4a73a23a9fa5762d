//! Docvec CLI - Command-line interface
//!
//! Usage:
//!   docvec collections
//!   docvec create <name> [--dimension N] [--distance cosine|dot|euclid]
//!   docvec delete <name> [--yes]
//!   docvec info <name>
//!   docvec add <collection> --source <file> [--field text]
//!   docvec query <collection> <text> [-k N]
//!
//! Configuration comes from the environment (QDRANT_URL, OPENAI_API_KEY,
//! EMBEDDING_MODEL, ...); see the project README.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use docvec_core::{AppConfig, Distance, Metadata};
use docvec_store::DocumentStore;
use docvec_vector::{create_embedding_provider, EmbeddingProvider, QdrantBackend, VectorBackend};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docvec")]
#[command(about = "Semantic document store over a vector database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all collections
    Collections,
    /// Create a collection
    Create {
        /// Collection name
        name: String,
        /// Vector dimension; defaults to the embedding model's dimension
        #[arg(long)]
        dimension: Option<usize>,
        /// Distance metric: cosine, dot, or euclid
        #[arg(long)]
        distance: Option<String>,
    },
    /// Delete a collection
    Delete {
        /// Collection name
        name: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Show information about a collection
    Info {
        /// Collection name
        name: String,
    },
    /// Add documents from a file
    Add {
        /// Target collection
        collection: String,
        /// Source file: JSON array of strings, JSON array of objects,
        /// or plain text (one document per line)
        #[arg(long, short)]
        source: PathBuf,
        /// Field holding the document text when the source is a JSON
        /// array of objects; remaining fields become metadata
        #[arg(long, short, default_value = "text")]
        field: String,
    },
    /// Search a collection for similar documents
    Query {
        /// Collection to search
        collection: String,
        /// Query text
        text: String,
        /// Number of results to return
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.level))
        .init();

    let cli = Cli::parse();

    let backend: Arc<dyn VectorBackend> = Arc::new(QdrantBackend::new(&config.backend)?);
    let provider: Arc<dyn EmbeddingProvider> =
        Arc::from(create_embedding_provider(&config.embedding)?);
    let store = DocumentStore::new(backend, provider, config.store.clone());

    match cli.command {
        Commands::Collections => {
            let collections = store.list_collections().await?;
            if collections.is_empty() {
                println!("No collections found");
            } else {
                for name in collections {
                    println!("{name}");
                }
            }
        }
        Commands::Create {
            name,
            dimension,
            distance,
        } => {
            let distance = distance.map(|d| d.parse::<Distance>()).transpose()?;
            if store.create_collection(&name, dimension, distance).await? {
                println!("Collection {name} created");
            } else {
                println!("Collection {name} already exists");
            }
        }
        Commands::Delete { name, yes } => {
            if !yes && !confirm(&format!("Delete collection '{name}'?"))? {
                println!("Cancelled");
                return Ok(());
            }

            if store.delete_collection(&name).await? {
                println!("Collection {name} deleted");
            } else {
                println!("Collection {name} not found");
            }
        }
        Commands::Info { name } => match store.collection_info(&name).await? {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => println!("Collection {name} not found"),
        },
        Commands::Add {
            collection,
            source,
            field,
        } => {
            let (texts, metadatas) = load_documents(&source, &field)?;
            if texts.is_empty() {
                bail!("No documents found in {}", source.display());
            }

            let ids = store.add_documents(&collection, texts, metadatas).await?;
            println!("Added {} documents to collection {collection}", ids.len());
        }
        Commands::Query {
            collection,
            text,
            k,
        } => {
            let results = store.search(&collection, &text, k).await?;
            if results.is_empty() {
                println!("No results found");
                return Ok(());
            }

            println!("Query: {text}\n");
            for (i, result) in results.iter().enumerate() {
                println!("{}. (score: {:.4})", i + 1, result.score);
                if let Some(text) = &result.text {
                    println!("   {text}");
                }
                if !result.metadata.is_empty() {
                    println!("   {}", serde_json::to_string(&result.metadata)?);
                }
            }
        }
    }

    Ok(())
}

/// Ask a yes/no question on stdin
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Load documents from a source file.
///
/// JSON sources may be an array of strings or an array of objects with
/// the text under `field` and every other key kept as metadata. Any
/// other file is treated as plain text, one document per line.
fn load_documents(
    path: &PathBuf,
    field: &str,
) -> anyhow::Result<(Vec<String>, Option<Vec<Metadata>>)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        let data: serde_json::Value =
            serde_json::from_str(&content).context("Failed to parse JSON source")?;

        let serde_json::Value::Array(items) = data else {
            bail!("JSON source must be an array of strings or objects");
        };

        if items.iter().all(|item| item.is_string()) {
            let texts = items
                .into_iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect();
            return Ok((texts, None));
        }

        if items.iter().all(|item| item.is_object()) {
            let mut texts = Vec::with_capacity(items.len());
            let mut metadatas = Vec::with_capacity(items.len());

            for item in items {
                let serde_json::Value::Object(mut object) = item else {
                    unreachable!()
                };
                let Some(text) = object.remove(field).and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                }) else {
                    bail!("Field '{field}' missing or not a string in JSON object");
                };

                texts.push(text);
                metadatas.push(object.into_iter().collect());
            }

            return Ok((texts, Some(metadatas)));
        }

        bail!("JSON source must be an array of strings or objects");
    }

    let texts = content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect();
    Ok((texts, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_json_strings() {
        let path = write_temp("docvec_strings.json", r#"["one", "two"]"#);
        let (texts, metadatas) = load_documents(&path, "text").unwrap();
        assert_eq!(texts, vec!["one", "two"]);
        assert!(metadatas.is_none());
    }

    #[test]
    fn test_load_json_objects_splits_text_and_metadata() {
        let path = write_temp(
            "docvec_objects.json",
            r#"[{"text": "cats", "source": "wiki"}, {"text": "dogs", "source": "blog"}]"#,
        );
        let (texts, metadatas) = load_documents(&path, "text").unwrap();
        assert_eq!(texts, vec!["cats", "dogs"]);

        let metadatas = metadatas.unwrap();
        assert_eq!(metadatas[0].get("source"), Some(&serde_json::json!("wiki")));
        assert!(metadatas[0].get("text").is_none());
    }

    #[test]
    fn test_load_plain_text_splits_lines() {
        let path = write_temp("docvec_plain.txt", "first\n\n  second  \n");
        let (texts, metadatas) = load_documents(&path, "text").unwrap();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(metadatas.is_none());
    }

    #[test]
    fn test_load_json_object_missing_field_fails() {
        let path = write_temp("docvec_missing.json", r#"[{"body": "cats"}]"#);
        assert!(load_documents(&path, "text").is_err());
    }
}
