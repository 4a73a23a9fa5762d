//! End-to-end pipeline tests
//!
//! Drive the full ingest/search pipeline against the in-memory backend
//! and a deterministic fake embedding provider, so every failure mode is
//! reachable without a running vector store or provider account.

use async_trait::async_trait;
use docvec_core::{Distance, DocvecError, Metadata, Result, StoreConfig};
use docvec_store::DocumentStore;
use docvec_vector::{
    EmbeddingProvider, InMemoryBackend, PointRecord, QueryMatch, VectorBackend,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Doubles
// ============================================================================

const VOCAB: [&str; 6] = ["mammals", "animals", "cats", "stock", "market", "fell"];

/// Deterministic bag-of-words embedder: one dimension per vocabulary
/// word. Related sentences share dimensions, so cosine ranking behaves
/// like a real model on the test corpus. Records every batch it sees.
struct FakeProvider {
    batches: Mutex<Vec<Vec<String>>>,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
        }
    }

    fn embed_calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn recorded_batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCAB
            .iter()
            .map(|word| if lower.contains(word) { 1.0 } else { 0.0 })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for FakeProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(texts.to_vec());
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn dimension(&self) -> usize {
        VOCAB.len()
    }
}

/// Backend wrapper that injects an upsert failure after N successes
struct FlakyBackend {
    inner: InMemoryBackend,
    upserts: AtomicUsize,
    fail_after: usize,
}

impl FlakyBackend {
    fn new(fail_after: usize) -> Self {
        Self {
            inner: InMemoryBackend::new(),
            upserts: AtomicUsize::new(0),
            fail_after,
        }
    }
}

#[async_trait]
impl VectorBackend for FlakyBackend {
    async fn list_collections(&self) -> Result<Vec<String>> {
        self.inner.list_collections().await
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<()> {
        self.inner.create_collection(name, dimension, distance).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn collection_info(
        &self,
        name: &str,
    ) -> Result<Option<docvec_core::CollectionInfo>> {
        self.inner.collection_info(name).await
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<()> {
        if self.upserts.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err(DocvecError::Backend("injected upsert failure".to_string()));
        }
        self.inner.upsert(collection, points).await
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<QueryMatch>> {
        self.inner.query(collection, vector, limit).await
    }
}

fn store_with(batch_size: usize) -> (DocumentStore, Arc<FakeProvider>) {
    let provider = Arc::new(FakeProvider::new());
    let store = DocumentStore::new(
        Arc::new(InMemoryBackend::new()),
        provider.clone(),
        StoreConfig {
            default_distance: Distance::Cosine,
            batch_size,
        },
    );
    (store, provider)
}

fn meta(key: &str, value: i64) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(key.to_string(), serde_json::json!(value));
    metadata
}

// ============================================================================
// Ingestion
// ============================================================================

#[tokio::test]
async fn test_add_creates_missing_collection_with_defaults() {
    let (store, provider) = store_with(100);

    assert!(!store.collection_exists("docs").await.unwrap());

    let ids = store
        .add_documents("docs", vec!["cats are mammals".to_string()], None)
        .await
        .unwrap();
    assert_eq!(ids.len(), 1);

    let info = store.collection_info("docs").await.unwrap().unwrap();
    assert_eq!(info.dimension, provider.dimension());
    assert_eq!(info.distance, Distance::Cosine);
    assert_eq!(info.points_count, 1);
}

#[tokio::test]
async fn test_length_mismatch_fails_before_any_network_call() {
    let (store, provider) = store_with(100);

    let err = store
        .add_documents(
            "docs",
            vec!["a".to_string(), "b".to_string()],
            Some(vec![meta("k", 1)]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DocvecError::Input(_)));
    assert_eq!(provider.embed_calls(), 0);
    // No implicit creation happened either
    assert!(store.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ids_are_unique_and_ordered() {
    let (store, _) = store_with(2);

    let texts: Vec<String> = (0..5).map(|i| format!("document {i}")).collect();
    let ids = store.add_documents("docs", texts, None).await.unwrap();

    assert_eq!(ids.len(), 5);
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);
}

#[tokio::test]
async fn test_empty_input_returns_no_ids() {
    let (store, provider) = store_with(10);

    let ids = store.add_documents("docs", Vec::new(), None).await.unwrap();
    assert!(ids.is_empty());
    assert_eq!(provider.embed_calls(), 0);
}

#[tokio::test]
async fn test_partial_batch_failure_keeps_committed_batches() {
    let provider = Arc::new(FakeProvider::new());
    let backend = Arc::new(FlakyBackend::new(2));
    let store = DocumentStore::new(
        backend.clone(),
        provider,
        StoreConfig {
            default_distance: Distance::Cosine,
            batch_size: 2,
        },
    );

    // Six texts in batches of two: the third upsert fails
    let texts: Vec<String> = (0..6).map(|i| format!("document {i}")).collect();
    let err = store.add_documents("docs", texts, None).await.unwrap_err();
    assert!(matches!(err, DocvecError::Backend(_)));

    // The first two batches stay committed, nothing after the failure
    let info = store.collection_info("docs").await.unwrap().unwrap();
    assert_eq!(info.points_count, 4);
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_round_trip_ranks_semantic_match_first() {
    let (store, _) = store_with(100);

    store
        .add_documents(
            "docs",
            vec![
                "cats are mammals".to_string(),
                "the stock market fell".to_string(),
            ],
            Some(vec![meta("k", 1), meta("k", 2)]),
        )
        .await
        .unwrap();

    let results = store
        .search("docs", "what animals are mammals?", 2)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text.as_deref(), Some("cats are mammals"));
    assert_eq!(results[0].metadata, meta("k", 1));
    assert_eq!(results[1].metadata, meta("k", 2));
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn test_search_missing_collection_is_not_found() {
    let (store, _) = store_with(100);

    let err = store.search("missing", "anything", 5).await.unwrap_err();
    assert!(matches!(err, DocvecError::NotFound(_)));

    // Search never creates collections implicitly
    assert!(store.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_returns_at_most_stored_points() {
    let (store, _) = store_with(100);

    store
        .add_documents("docs", vec!["cats are mammals".to_string()], None)
        .await
        .unwrap();

    let results = store.search("docs", "cats", 10).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_search_embeds_query_exactly_once() {
    let (store, provider) = store_with(100);

    store
        .add_documents("docs", vec!["cats are mammals".to_string()], None)
        .await
        .unwrap();
    let calls_after_add = provider.embed_calls();

    store.search("docs", "cats", 1).await.unwrap();
    assert_eq!(provider.embed_calls(), calls_after_add + 1);
}

// ============================================================================
// Collection lifecycle through the facade
// ============================================================================

#[tokio::test]
async fn test_create_applies_configured_defaults() {
    let (store, provider) = store_with(100);

    assert!(store.create_collection("docs", None, None).await.unwrap());
    let info = store.collection_info("docs").await.unwrap().unwrap();
    assert_eq!(info.dimension, provider.dimension());
    assert_eq!(info.distance, Distance::Cosine);

    // Soft failure on repeat, dimension unchanged
    assert!(!store
        .create_collection("docs", Some(999), Some(Distance::Euclid))
        .await
        .unwrap());
    let info = store.collection_info("docs").await.unwrap().unwrap();
    assert_eq!(info.dimension, provider.dimension());
}

#[tokio::test]
async fn test_delete_then_exists() {
    let (store, _) = store_with(100);

    assert!(!store.delete_collection("docs").await.unwrap());
    store.create_collection("docs", Some(4), None).await.unwrap();
    assert!(store.delete_collection("docs").await.unwrap());
    assert!(!store.collection_exists("docs").await.unwrap());
}

// ============================================================================
// Batching invariant
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For texts of length N and batch size B, ingestion issues
    /// ceil(N/B) embed calls and the same number of upserts, each of
    /// size <= B, covering all N items exactly once in input order.
    #[test]
    fn prop_batching_invariant(n in 0usize..50, batch_size in 1usize..10) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (store, provider) = store_with(batch_size);

            let texts: Vec<String> = (0..n).map(|i| format!("document {i}")).collect();
            let ids = store
                .add_documents("docs", texts.clone(), None)
                .await
                .unwrap();

            prop_assert_eq!(ids.len(), n);

            let batches = provider.recorded_batches();
            prop_assert_eq!(batches.len(), n.div_ceil(batch_size));
            for batch in &batches {
                prop_assert!(batch.len() <= batch_size);
            }

            let flattened: Vec<String> = batches.into_iter().flatten().collect();
            prop_assert_eq!(flattened, texts);

            let info = store.collection_info("docs").await.unwrap().unwrap();
            prop_assert_eq!(info.points_count, n as u64);
            Ok(())
        })?;
    }
}
