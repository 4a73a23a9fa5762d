//! In-memory vector store backend
//!
//! Exact-scan implementation of `VectorBackend` used by tests and
//! offline development. Behaves like the real backend at the seams:
//! dimension is fixed at creation and enforced on upsert, duplicate
//! creation is rejected, and queries rank by the collection's metric.

use async_trait::async_trait;
use docvec_core::{CollectionInfo, CollectionStatus, Distance, DocvecError, Result};
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{PointRecord, QueryMatch, VectorBackend};

struct MemoryCollection {
    dimension: usize,
    distance: Distance,
    points: Vec<PointRecord>,
}

/// In-memory vector store
#[derive(Default)]
pub struct InMemoryBackend {
    collections: RwLock<BTreeMap<String, MemoryCollection>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Score a candidate against the query vector.
///
/// Cosine and dot produce similarities (higher is closer); Euclidean
/// produces a distance (lower is closer).
fn score(distance: Distance, query: &[f32], candidate: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => {
            let dot: f32 = query.iter().zip(candidate).map(|(a, b)| a * b).sum();
            let norm_q: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_c: f32 = candidate.iter().map(|x| x * x).sum::<f32>().sqrt();
            dot / (norm_q * norm_c + 1e-10)
        }
        Distance::Dot => query.iter().zip(candidate).map(|(a, b)| a * b).sum(),
        Distance::Euclid => query
            .iter()
            .zip(candidate)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt(),
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().expect("lock poisoned");
        Ok(collections.keys().cloned().collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<()> {
        let mut collections = self.collections.write().expect("lock poisoned");
        if collections.contains_key(name) {
            return Err(DocvecError::Backend(format!(
                "Collection {name} already exists"
            )));
        }

        collections.insert(
            name.to_string(),
            MemoryCollection {
                dimension,
                distance,
                points: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().expect("lock poisoned");
        collections.remove(name);
        Ok(())
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let collections = self.collections.read().expect("lock poisoned");
        Ok(collections.get(name).map(|c| CollectionInfo {
            name: name.to_string(),
            dimension: c.dimension,
            distance: c.distance,
            points_count: c.points.len() as u64,
            status: CollectionStatus::Green,
        }))
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<()> {
        let mut collections = self.collections.write().expect("lock poisoned");
        let target = collections.get_mut(collection).ok_or_else(|| {
            DocvecError::Backend(format!("Upsert into unknown collection {collection}"))
        })?;

        // Validate the whole batch before writing anything, so a point is
        // never partially written
        for point in &points {
            if point.vector.len() != target.dimension {
                return Err(DocvecError::Backend(format!(
                    "Dimension mismatch: collection {collection} expects {}, got {}",
                    target.dimension,
                    point.vector.len()
                )));
            }
        }

        for point in points {
            if let Some(existing) = target.points.iter_mut().find(|p| p.id == point.id) {
                *existing = point;
            } else {
                target.points.push(point);
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<QueryMatch>> {
        let collections = self.collections.read().expect("lock poisoned");
        let target = collections.get(collection).ok_or_else(|| {
            DocvecError::Backend(format!("Query against unknown collection {collection}"))
        })?;

        let mut scored: Vec<QueryMatch> = target
            .points
            .iter()
            .map(|p| QueryMatch {
                id: p.id.clone(),
                score: score(target.distance, vector, &p.vector),
                text: p.text.clone(),
                metadata: p.metadata.clone(),
            })
            .collect();

        match target.distance {
            // Euclidean is a distance: closest first means ascending
            Distance::Euclid => {
                scored.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
            }
            _ => scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)),
        }

        scored.truncate(limit);
        Ok(scored)
    }
}
