//! Similarity search
//!
//! Embeds a query string, runs a nearest-neighbor query against the
//! backend, and formats ranked results. Search never creates a
//! collection implicitly: a missing collection is a hard error rather
//! than a silently empty result.

use docvec_core::{DocvecError, Result, ScoredDocument};
use docvec_vector::{EmbeddingProvider, VectorBackend};
use std::sync::Arc;

use crate::collections::CollectionManager;

/// Runs similarity searches against a collection
pub struct SearchEngine {
    backend: Arc<dyn VectorBackend>,
    provider: Arc<dyn EmbeddingProvider>,
    manager: CollectionManager,
}

impl SearchEngine {
    pub fn new(backend: Arc<dyn VectorBackend>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let manager = CollectionManager::new(backend.clone());
        Self {
            backend,
            provider,
            manager,
        }
    }

    /// Return the `k` most similar documents to `query`, most-similar
    /// first in the backend's own order. Returns fewer than `k` results
    /// when the collection holds fewer points.
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        if !self.manager.exists(collection).await? {
            return Err(DocvecError::NotFound(collection.to_string()));
        }

        let vector = self.provider.embed_one(query).await?;
        let matches = self.backend.query(collection, &vector, k).await?;
        tracing::debug!(collection, k, results = matches.len(), "Search completed");

        // Formatting-only transform; order and score precision are the
        // backend's
        Ok(matches
            .into_iter()
            .map(|m| ScoredDocument {
                text: m.text,
                metadata: m.metadata,
                score: m.score,
            })
            .collect())
    }
}
