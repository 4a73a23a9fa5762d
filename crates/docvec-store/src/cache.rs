//! Embedding cache
//!
//! Opt-in per-text cache wrapped around any embedding provider, keyed by
//! text hash. A batch embed resolves hits locally and forwards only the
//! misses to the inner provider in a single call. Uses the moka crate
//! for thread-safe, async-compatible caching with TTL support.
//!
//! Collection existence checks are never cached; only embeddings are,
//! since they are a pure function of the input text.

use async_trait::async_trait;
use docvec_core::{DocvecError, Result};
use docvec_vector::EmbeddingProvider;
use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the embedding cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached embeddings
    pub max_capacity: u64,

    /// Time-to-live for cache entries (in seconds)
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 10k embeddings @ ~6KB each = ~60MB
            max_capacity: 10_000,
            // Embeddings are stable for a given model; one hour
            ttl_seconds: 3600,
        }
    }
}

/// Hit/miss counters for the embedding cache
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Caching wrapper around an embedding provider
pub struct CachedEmbeddings {
    inner: Arc<dyn EmbeddingProvider>,
    cache: Cache<u64, Vec<f32>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedEmbeddings {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .build();

        Self {
            inner,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn key(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut resolved: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(&Self::key(text)).await {
                Some(vector) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    resolved.push(Some(vector));
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    resolved.push(None);
                    miss_indices.push(i);
                    miss_texts.push(text.clone());
                }
            }
        }

        if !miss_texts.is_empty() {
            let vectors = self.inner.embed(&miss_texts).await?;
            if vectors.len() != miss_texts.len() {
                return Err(DocvecError::Provider(format!(
                    "Provider returned {} embeddings for {} inputs",
                    vectors.len(),
                    miss_texts.len()
                )));
            }

            for (slot, (text, vector)) in miss_indices
                .into_iter()
                .zip(miss_texts.into_iter().zip(vectors))
            {
                self.cache.insert(Self::key(&text), vector.clone()).await;
                resolved[slot] = Some(vector);
            }
        }

        Ok(resolved.into_iter().flatten().collect())
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
