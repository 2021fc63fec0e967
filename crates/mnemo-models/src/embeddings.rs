//! Embedding providers.
//!
//! `OpenAIEmbedder` calls the embeddings API; `HashEmbedder` is a
//! deterministic offline embedder (character trigram feature hashing) used
//! for tests and local runs where no endpoint is available.

use async_trait::async_trait;
use mnemo_abstraction::{Embedder, ModelError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// OpenAI embeddings API client.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedder {
    /// The embedding model ID.
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the OpenAI API.
    base_url: String,
    client: Client,
}

impl OpenAIEmbedder {
    /// Creates a new embedder with an explicit API key.
    #[must_use]
    pub fn with_api_key(api_key: String) -> Self {
        Self {
            model_id: "text-embedding-3-small".to_string(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            client: Client::new(),
        }
    }

    /// Overrides the embedding model ID.
    #[must_use]
    pub fn with_model(mut self, model_id: String) -> Self {
        self.model_id = model_id;
        self
    }

    /// Overrides the base URL (used for tests and compatible endpoints).
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        debug!(model_id = %self.model_id, text_len = text.len(), "Embedding text");

        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest { model: &self.model_id, input: text };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send embeddings request");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ModelError::ModelResponseError("Response contained no data".to_string()))
    }

    fn dimension(&self) -> usize {
        match self.model_id.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }
}

/// Deterministic offline embedder using character trigram feature hashing.
///
/// Identical texts embed to identical vectors, so self-similarity distance
/// is exactly zero. Vectors are L2 normalized.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

/// Default hashed-feature dimension.
const DEFAULT_HASH_DIMENSION: usize = 256;

impl HashEmbedder {
    /// Creates an embedder with the default dimension.
    #[must_use]
    pub fn new() -> Self {
        Self { dimension: DEFAULT_HASH_DIMENSION }
    }

    /// Creates an embedder with an explicit dimension.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    // FNV-1a, kept inline so hashed features are stable across builds.
    fn fnv1a(bytes: &[u8]) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in bytes {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let normalized = text.to_lowercase();
        let chars: Vec<char> = normalized.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        // Pad so that single- and two-character texts still produce features.
        let mut padded = vec!['^'];
        padded.extend(chars);
        padded.push('$');

        for window in padded.windows(3) {
            let trigram: String = window.iter().collect();
            let slot = (Self::fnv1a(trigram.as_bytes()) as usize) % self.dimension;
            vector[slot] += 1.0;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("cell phone towers").await.unwrap();
        let b = embedder.embed("cell phone towers").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_hash_embedder_normalizes() {
        let embedder = HashEmbedder::new();
        let v = embedder.embed("some text").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hash_embedder_distinguishes_texts() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("vampires in the village").await.unwrap();
        let b = embedder.embed("minimum number of towers").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_hash_embedder_empty_text() {
        let embedder = HashEmbedder::with_dimension(16);
        let v = embedder.embed("").await.unwrap();
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_openai_embedder_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"embedding": [0.1, 0.2, 0.3]}]}"#)
            .create_async()
            .await;

        let embedder =
            OpenAIEmbedder::with_api_key("k".to_string()).with_base_url(server.url());
        let v = embedder.embed("hello").await.unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }
}
