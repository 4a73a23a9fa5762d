//! Collection lifecycle management
//!
//! Owns create/list/delete/describe/exists against the vector store
//! backend. Mutating operations are soft: creating an existing collection
//! or deleting a missing one returns false instead of an error, so the
//! surface reads as idempotent. The existence check and the subsequent
//! mutation are not atomic; concurrent callers racing on the same name
//! surface the backend's own rejection as a recoverable error.

use docvec_core::{CollectionInfo, Distance, Result};
use docvec_vector::VectorBackend;
use std::sync::Arc;

/// Manages collection lifecycle against the backend
#[derive(Clone)]
pub struct CollectionManager {
    backend: Arc<dyn VectorBackend>,
}

impl CollectionManager {
    pub fn new(backend: Arc<dyn VectorBackend>) -> Self {
        Self { backend }
    }

    /// List all collection names
    pub async fn list(&self) -> Result<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Check whether a collection exists.
    ///
    /// Membership test against `list()`; every call is authoritative and
    /// reflects the backend's current state.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let collections = self.list().await?;
        Ok(collections.iter().any(|c| c == name))
    }

    /// Create a collection; returns false if it already exists
    pub async fn create(&self, name: &str, dimension: usize, distance: Distance) -> Result<bool> {
        if self.exists(name).await? {
            tracing::warn!(collection = name, "Collection already exists");
            return Ok(false);
        }

        self.backend.create_collection(name, dimension, distance).await?;
        tracing::info!(collection = name, dimension, %distance, "Created collection");
        Ok(true)
    }

    /// Delete a collection; returns false if it does not exist
    pub async fn delete(&self, name: &str) -> Result<bool> {
        if !self.exists(name).await? {
            tracing::warn!(collection = name, "Collection does not exist");
            return Ok(false);
        }

        self.backend.delete_collection(name).await?;
        tracing::info!(collection = name, "Deleted collection");
        Ok(true)
    }

    /// Describe a collection; `None` if it does not exist
    pub async fn describe(&self, name: &str) -> Result<Option<CollectionInfo>> {
        if !self.exists(name).await? {
            tracing::warn!(collection = name, "Collection does not exist");
            return Ok(None);
        }

        self.backend.collection_info(name).await
    }
}
