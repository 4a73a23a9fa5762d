//! Docvec Vector - External service seams
//!
//! Abstractions over the two external services the store consumes:
//! the vector store backend (Qdrant, plus an in-memory implementation
//! for tests and offline use) and the embedding provider.

use async_trait::async_trait;
use docvec_core::{CollectionInfo, Distance, Metadata, Result};

/// One stored unit: id, vector, optional text, optional metadata
#[derive(Debug, Clone)]
pub struct PointRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: Option<String>,
    pub metadata: Metadata,
}

/// One ranked match from a nearest-neighbor query
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub text: Option<String>,
    pub metadata: Metadata,
}

/// Trait for vector store backends
///
/// Implementations must support opaque per-point metadata and return
/// scores alongside matches. Collection dimension is immutable once set.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// List all collection names
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Allocate a collection with the given dimension and distance metric
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<()>;

    /// Remove a collection and all of its points
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Structured snapshot of a collection, `None` if it does not exist
    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>>;

    /// Write points as a single batch; a point is never partially written
    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<()>;

    /// Nearest-neighbor query, ranked most-similar first by the
    /// collection's distance metric
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<QueryMatch>>;
}

pub mod embedding;
pub mod memory;
pub mod qdrant_backend;

pub use embedding::{create_embedding_provider, EmbeddingProvider, OllamaEmbedding, OpenAiEmbedding};
pub use memory::InMemoryBackend;
pub use qdrant_backend::QdrantBackend;
