//! Docvec Core - Domain models, traits, and shared types
//!
//! This crate defines the abstractions used throughout the docvec system:
//! - Error taxonomy and `Result` alias
//! - Collection and search-result models
//! - The `DocumentOps` capability trait bound by any dispatcher
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, BackendConfig, ConfigError, EmbeddingConfig, EmbeddingProviderKind, LoggingConfig,
    StoreConfig,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for docvec operations
#[derive(Error, Debug)]
pub enum DocvecError {
    /// Malformed caller input, detected before any I/O
    #[error("Invalid input: {0}")]
    Input(String),

    /// Operation requires a collection that does not exist
    #[error("Collection not found: {0}")]
    NotFound(String),

    /// Embedding provider failure (unreachable, rate-limited, malformed response)
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// Vector store failure (unreachable, rejected write, dimension mismatch)
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DocvecError>;

// ============================================================================
// Collection Models
// ============================================================================

/// Distance metric used to rank vector similarity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Dot => write!(f, "dot"),
            Self::Euclid => write!(f, "euclid"),
        }
    }
}

impl std::str::FromStr for Distance {
    type Err = DocvecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot" | "dot-product" => Ok(Self::Dot),
            "euclid" | "euclidean" => Ok(Self::Euclid),
            _ => Err(DocvecError::Input(format!("Unknown distance metric: {s}"))),
        }
    }
}

/// Health status of a collection as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl std::fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
            Self::Red => write!(f, "red"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Structured snapshot of a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name
    pub name: String,

    /// Vector dimension, immutable once set
    pub dimension: usize,

    /// Distance metric configured at creation
    pub distance: Distance,

    /// Number of points currently stored
    pub points_count: u64,

    /// Backend health status
    pub status: CollectionStatus,
}

// ============================================================================
// Search Models
// ============================================================================

/// Arbitrary per-document metadata (string keys, JSON values)
pub type Metadata = HashMap<String, serde_json::Value>;

/// One similarity search result
///
/// Ephemeral, never persisted. Score interpretation follows the collection's
/// distance metric: higher is more similar for cosine/dot, lower for
/// Euclidean unless the backend normalizes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// Original document text, if it was stored
    pub text: Option<String>,

    /// Metadata supplied at ingestion time
    pub metadata: Metadata,

    /// Match score as reported by the backend
    pub score: f32,
}

// ============================================================================
// Capability Trait
// ============================================================================

/// The full programmatic surface of the document store.
///
/// Any dispatcher (rule-based, LLM-driven, or scripted) binds to these
/// operations uniformly. `create_collection` applies the configured default
/// dimension and distance when the caller omits them.
#[async_trait::async_trait]
pub trait DocumentOps: Send + Sync {
    /// List all collection names
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Check whether a collection exists
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a collection; returns false if it already exists
    async fn create_collection(
        &self,
        name: &str,
        dimension: Option<usize>,
        distance: Option<Distance>,
    ) -> Result<bool>;

    /// Delete a collection; returns false if it does not exist
    async fn delete_collection(&self, name: &str) -> Result<bool>;

    /// Describe a collection; `None` if it does not exist
    async fn collection_info(&self, name: &str) -> Result<Option<CollectionInfo>>;

    /// Embed and store documents, returning one id per input text
    async fn add_documents(
        &self,
        collection: &str,
        texts: Vec<String>,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<Vec<String>>;

    /// Similarity search, most-similar first
    async fn search(&self, collection: &str, query: &str, k: usize)
        -> Result<Vec<ScoredDocument>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_parse() {
        assert_eq!("cosine".parse::<Distance>().unwrap(), Distance::Cosine);
        assert_eq!("Dot-Product".parse::<Distance>().unwrap(), Distance::Dot);
        assert_eq!("euclidean".parse::<Distance>().unwrap(), Distance::Euclid);
        assert!("manhattan".parse::<Distance>().is_err());
    }

    #[test]
    fn test_distance_display_roundtrip() {
        for d in [Distance::Cosine, Distance::Dot, Distance::Euclid] {
            assert_eq!(d.to_string().parse::<Distance>().unwrap(), d);
        }
    }

    #[test]
    fn test_error_messages() {
        let err = DocvecError::NotFound("docs".to_string());
        assert_eq!(err.to_string(), "Collection not found: docs");

        let err = DocvecError::Input("texts and metadatas differ in length".to_string());
        assert!(err.to_string().starts_with("Invalid input"));
    }

    #[test]
    fn test_collection_info_serde() {
        let info = CollectionInfo {
            name: "docs".to_string(),
            dimension: 384,
            distance: Distance::Cosine,
            points_count: 2,
            status: CollectionStatus::Green,
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["distance"], "cosine");
        assert_eq!(json["status"], "green");
        assert_eq!(json["dimension"], 384);
    }
}
