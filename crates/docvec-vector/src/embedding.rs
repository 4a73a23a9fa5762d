//! Embedding provider adapters
//!
//! Converts text into fixed-dimension vectors via an external service.
//! Supports the OpenAI and Ollama embedding APIs. Adapters are stateless,
//! order-preserving, and never retry; retry policy belongs to the caller.

use async_trait::async_trait;
use docvec_core::{DocvecError, EmbeddingConfig, EmbeddingProviderKind, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Trait
// ============================================================================

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, order-preserving
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let vectors = self.embed(&texts).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| DocvecError::Provider("No embedding returned".to_string()))
    }

    /// Output vector dimension, fixed per model configuration
    fn dimension(&self) -> usize;
}

// ============================================================================
// OpenAI Provider
// ============================================================================

/// OpenAI embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client, inferring the dimension
    /// from the model name
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        };

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model,
            dimension,
        }
    }

    /// Create from config, using the configured dimension
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| DocvecError::Config("OpenAI API key required".to_string()))?;

        let mut provider = Self::new(api_key.clone(), config.model.clone());
        provider.dimension = config.dimension;
        Ok(provider)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OpenAiEmbeddingRequest {
            input: texts.to_vec(),
            model: self.model.clone(),
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DocvecError::Provider(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocvecError::Provider(format!(
                "OpenAI embedding error ({status}): {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            DocvecError::Provider(format!("Failed to parse embedding response: {e}"))
        })?;

        if result.data.len() != texts.len() {
            return Err(DocvecError::Provider(format!(
                "Provider returned {} embeddings for {} inputs",
                result.data.len(),
                texts.len()
            )));
        }

        // The API may return entries out of order; restore input order
        let mut embeddings: Vec<_> = result.data.into_iter().collect();
        embeddings.sort_by_key(|e| e.index);

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Ollama Provider
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client, inferring the dimension
    /// from the model name
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            _ => 768,
        };

        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model,
            dimension,
        }
    }

    /// Create from config, using the configured dimension
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let mut provider = Self::new(config.ollama_url.clone(), config.model.clone());
        provider.dimension = config.dimension;
        provider
    }

    async fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| DocvecError::Provider(format!("Ollama embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocvecError::Provider(format!(
                "Ollama embedding error ({status}): {error_text}"
            )));
        }

        let result: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            DocvecError::Provider(format!("Failed to parse embedding response: {e}"))
        })?;

        Ok(result.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Ollama has no native batch endpoint; embed sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed_single(text).await?);
        }
        Ok(results)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_single(text).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Create an embedding provider from config
pub fn create_embedding_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderKind::OpenAi => Ok(Box::new(OpenAiEmbedding::from_config(config)?)),
        EmbeddingProviderKind::Ollama => Ok(Box::new(OllamaEmbedding::from_config(config))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_dimension_table() {
        let provider = OpenAiEmbedding::new("test-key", "text-embedding-3-small");
        assert_eq!(provider.dimension(), 1536);

        let provider = OpenAiEmbedding::new("test-key", "text-embedding-3-large");
        assert_eq!(provider.dimension(), 3072);
    }

    #[test]
    fn test_ollama_dimension_table() {
        let provider = OllamaEmbedding::new("http://localhost:11434", "nomic-embed-text");
        assert_eq!(provider.dimension(), 768);

        let provider = OllamaEmbedding::new("http://localhost:11434", "all-minilm");
        assert_eq!(provider.dimension(), 384);
    }

    #[test]
    fn test_config_dimension_overrides_table() {
        let config = EmbeddingConfig {
            openai_api_key: Some("test-key".to_string()),
            model: "text-embedding-3-small".to_string(),
            dimension: 384,
            ..Default::default()
        };

        let provider = OpenAiEmbedding::from_config(&config).unwrap();
        assert_eq!(provider.dimension(), 384);
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = EmbeddingConfig {
            openai_api_key: None,
            ..Default::default()
        };
        assert!(OpenAiEmbedding::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let provider = OpenAiEmbedding::new("test-key", "text-embedding-3-small");
        let vectors = provider.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
