//! Docvec Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for local development. The configuration layer
//! resolves and validates settings; the store itself only consumes them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Vector store backend connection
    pub backend: BackendConfig,

    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,

    /// Ingestion and collection defaults
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Backend
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.backend.url = url;
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY") {
            config.backend.api_key = Some(key);
        }

        // Embedding provider
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider.parse()?;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.embedding.openai_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.embedding.ollama_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIMENSION") {
            config.embedding.dimension = dim.parse().map_err(|_| ConfigError::InvalidValue {
                key: "EMBEDDING_DIMENSION".to_string(),
                value: dim,
            })?;
        }

        // Store defaults
        if let Ok(distance) = std::env::var("DISTANCE_METRIC") {
            config.store.default_distance =
                distance.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "DISTANCE_METRIC".to_string(),
                    value: distance,
                })?;
        }
        if let Ok(batch) = std::env::var("BATCH_SIZE") {
            config.store.batch_size = batch.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BATCH_SIZE".to_string(),
                value: batch,
            })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        if env_config.backend.url != BackendConfig::default().url {
            self.backend.url = env_config.backend.url;
        }
        if env_config.store.batch_size != StoreConfig::default().batch_size {
            self.store.batch_size = env_config.store.batch_size;
        }

        // Always prefer env for credentials
        if env_config.backend.api_key.is_some() {
            self.backend.api_key = env_config.backend.api_key;
        }
        if env_config.embedding.openai_api_key.is_some() {
            self.embedding.openai_api_key = env_config.embedding.openai_api_key;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject configurations the store cannot operate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BATCH_SIZE".to_string(),
                value: "0".to_string(),
            });
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "EMBEDDING_DIMENSION".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Vector store backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Qdrant gRPC URL
    pub url: String,

    /// API key for hosted deployments
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider to use
    pub provider: EmbeddingProviderKind,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Embedding model name
    pub model: String,

    /// Vector dimension produced by the model, fixed process-wide
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::OpenAi,
            openai_api_key: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }
}

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    OpenAi,
    Ollama,
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Ingestion and collection defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Distance metric for implicitly created collections
    pub default_distance: crate::Distance,

    /// Maximum number of documents per embed+upsert round trip
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_distance: crate::Distance::Cosine,
            batch_size: 100,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend.url, "http://localhost:6334");
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.store.batch_size, 100);
        assert_eq!(config.store.default_distance, crate::Distance::Cosine);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(
            "openai".parse::<EmbeddingProviderKind>().unwrap(),
            EmbeddingProviderKind::OpenAi
        );
        assert_eq!(
            "Ollama".parse::<EmbeddingProviderKind>().unwrap(),
            EmbeddingProviderKind::Ollama
        );
        assert!("cohere".parse::<EmbeddingProviderKind>().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = AppConfig::default();
        config.store.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            [backend]
            url = "http://qdrant.internal:6334"

            [embedding]
            provider = "ollama"
            ollama_url = "http://localhost:11434"
            model = "nomic-embed-text"
            dimension = 768

            [store]
            default_distance = "euclid"
            batch_size = 32

            [logging]
            level = "debug"
            json_format = false
        "#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.store.default_distance, crate::Distance::Euclid);
        assert_eq!(config.store.batch_size, 32);
    }
}
