//! Docvec Store - Document ingestion and similarity search pipeline
//!
//! Ties the collection manager, document ingestor, and search engine
//! together over an injected vector backend and embedding provider.
//! `DocumentStore` is the facade consumers hold; it implements the
//! `DocumentOps` capability trait so dispatchers of any kind (CLI,
//! scripted, LLM-driven) bind to one uniform surface.

use docvec_core::{
    CollectionInfo, Distance, DocumentOps, Metadata, Result, ScoredDocument, StoreConfig,
};
use docvec_vector::{EmbeddingProvider, VectorBackend};
use std::sync::Arc;

pub mod cache;
pub mod collections;
pub mod ingest;
pub mod search;

pub use cache::{CacheConfig, CacheStats, CachedEmbeddings};
pub use collections::CollectionManager;
pub use ingest::DocumentIngestor;
pub use search::SearchEngine;

/// Facade over the full document pipeline.
///
/// Constructed from explicit dependencies; there is no process-wide
/// client instance. Cloning the `Arc`s is cheap, so one store can be
/// shared across tasks to whatever extent the backend client allows.
pub struct DocumentStore {
    provider: Arc<dyn EmbeddingProvider>,
    manager: CollectionManager,
    ingestor: DocumentIngestor,
    engine: SearchEngine,
    config: StoreConfig,
    backend: Arc<dyn VectorBackend>,
}

impl DocumentStore {
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        provider: Arc<dyn EmbeddingProvider>,
        config: StoreConfig,
    ) -> Self {
        let manager = CollectionManager::new(backend.clone());
        let ingestor = DocumentIngestor::new(
            backend.clone(),
            provider.clone(),
            config.default_distance,
            config.batch_size,
        );
        let engine = SearchEngine::new(backend.clone(), provider.clone());

        Self {
            provider,
            manager,
            ingestor,
            engine,
            config,
            backend,
        }
    }

    /// Wrap the embedding provider in a per-text cache
    pub fn with_embedding_cache(self, cache_config: &CacheConfig) -> Self {
        let cached: Arc<dyn EmbeddingProvider> =
            Arc::new(CachedEmbeddings::new(self.provider.clone(), cache_config));
        Self::new(self.backend, cached, self.config)
    }

    /// List all collection names
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.manager.list().await
    }

    /// Check whether a collection exists
    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.manager.exists(name).await
    }

    /// Create a collection; omitted dimension/distance fall back to the
    /// provider's dimension and the configured default metric
    pub async fn create_collection(
        &self,
        name: &str,
        dimension: Option<usize>,
        distance: Option<Distance>,
    ) -> Result<bool> {
        let dimension = dimension.unwrap_or_else(|| self.provider.dimension());
        let distance = distance.unwrap_or(self.config.default_distance);
        self.manager.create(name, dimension, distance).await
    }

    /// Delete a collection; returns false if it does not exist
    pub async fn delete_collection(&self, name: &str) -> Result<bool> {
        self.manager.delete(name).await
    }

    /// Describe a collection; `None` if it does not exist
    pub async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        self.manager.describe(name).await
    }

    /// Embed and store documents, returning one id per input text
    pub async fn add_documents(
        &self,
        collection: &str,
        texts: Vec<String>,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<Vec<String>> {
        self.ingestor.add(collection, texts, metadatas).await
    }

    /// Similarity search, most-similar first
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        self.engine.search(collection, query, k).await
    }
}

#[async_trait::async_trait]
impl DocumentOps for DocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        DocumentStore::list_collections(self).await
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        DocumentStore::collection_exists(self, name).await
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: Option<usize>,
        distance: Option<Distance>,
    ) -> Result<bool> {
        DocumentStore::create_collection(self, name, dimension, distance).await
    }

    async fn delete_collection(&self, name: &str) -> Result<bool> {
        DocumentStore::delete_collection(self, name).await
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        DocumentStore::collection_info(self, name).await
    }

    async fn add_documents(
        &self,
        collection: &str,
        texts: Vec<String>,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<Vec<String>> {
        DocumentStore::add_documents(self, collection, texts, metadatas).await
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        DocumentStore::search(self, collection, query, k).await
    }
}
