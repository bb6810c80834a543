//! Embedding provider abstraction.
//!
//! The embedding model is an external collaborator: the retrieval core only
//! relies on the contract that every text maps to a fixed-length vector of
//! the provider's dimension.

pub mod mock;
pub mod ollama;

pub use mock::MockEmbedder;
pub use ollama::OllamaEmbedder;

use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate the embedding vector for one text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    provider: &str,
    model: &str,
    dimensions: usize,
    endpoint: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider.to_lowercase().as_str() {
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(model, dimensions, endpoint))),
        "mock" => Ok(Arc::new(MockEmbedder::new(dimensions))),
        _ => Err(AppError::InvalidConfig(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, mock",
            provider
        ))),
    }
}
