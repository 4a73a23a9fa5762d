//! Batched document ingestion
//!
//! Embeds raw texts, assigns ids, and writes points to a collection in
//! bounded batches. Batches are processed strictly in input order; each
//! batch is one embed call and one upsert. A failing batch aborts the
//! whole call and leaves earlier batches committed (at-least-once, no
//! rollback).

use docvec_core::{Distance, DocvecError, Metadata, Result};
use docvec_vector::{EmbeddingProvider, PointRecord, VectorBackend};
use std::sync::Arc;
use uuid::Uuid;

use crate::collections::CollectionManager;

/// Ingests documents into collections
pub struct DocumentIngestor {
    backend: Arc<dyn VectorBackend>,
    provider: Arc<dyn EmbeddingProvider>,
    manager: CollectionManager,
    default_distance: Distance,
    batch_size: usize,
}

impl DocumentIngestor {
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        provider: Arc<dyn EmbeddingProvider>,
        default_distance: Distance,
        batch_size: usize,
    ) -> Self {
        let manager = CollectionManager::new(backend.clone());
        Self {
            backend,
            provider,
            manager,
            default_distance,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed and store documents, returning one assigned id per input text.
    ///
    /// Creates the collection with the process-wide default dimension and
    /// distance metric if it does not exist yet.
    pub async fn add(
        &self,
        collection: &str,
        texts: Vec<String>,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<Vec<String>> {
        if let Some(metadatas) = &metadatas {
            if metadatas.len() != texts.len() {
                return Err(DocvecError::Input(format!(
                    "texts and metadatas differ in length: {} vs {}",
                    texts.len(),
                    metadatas.len()
                )));
            }
        }

        if !self.manager.exists(collection).await? {
            tracing::info!(
                collection,
                dimension = self.provider.dimension(),
                distance = %self.default_distance,
                "Collection does not exist, creating it"
            );
            self.manager
                .create(collection, self.provider.dimension(), self.default_distance)
                .await?;
        }

        let total_batches = texts.len().div_ceil(self.batch_size);
        let mut ids = Vec::with_capacity(texts.len());

        for (batch_index, chunk) in texts.chunks(self.batch_size).enumerate() {
            let vectors = self.provider.embed(chunk).await?;
            if vectors.len() != chunk.len() {
                return Err(DocvecError::Provider(format!(
                    "Provider returned {} embeddings for a batch of {}",
                    vectors.len(),
                    chunk.len()
                )));
            }

            let offset = batch_index * self.batch_size;
            let mut points = Vec::with_capacity(chunk.len());
            let mut batch_ids = Vec::with_capacity(chunk.len());

            for (i, (text, vector)) in chunk.iter().zip(vectors).enumerate() {
                let id = Uuid::new_v4().to_string();
                let metadata = metadatas
                    .as_ref()
                    .map(|m| m[offset + i].clone())
                    .unwrap_or_default();

                points.push(PointRecord {
                    id: id.clone(),
                    vector,
                    text: Some(text.clone()),
                    metadata,
                });
                batch_ids.push(id);
            }

            self.backend.upsert(collection, points).await?;
            tracing::debug!(
                collection,
                batch = batch_index + 1,
                total_batches,
                size = chunk.len(),
                "Committed batch"
            );

            ids.extend(batch_ids);
        }

        tracing::info!(collection, count = ids.len(), "Added documents");
        Ok(ids)
    }
}
