//! Text-to-vector embedding pipeline.
//!
//! Provides the [`Embedder`] trait and a remote implementation speaking the
//! OpenAI-compatible `/embeddings` protocol. The encoder is a black box: all
//! this crate cares about is that the same text always maps to the same
//! vector, and that failures surface as [`EmbedError`] rather than as empty
//! results.

pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the embedding service, kept distinct from "no results found".
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Transport(String),

    #[error("embedding service error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("embedding response malformed: {0}")]
    Malformed(String),
}

/// Trait for embedding text into vectors.
///
/// Implementations produce vectors of exactly `dimensions()` length, and the
/// same input text always produces the same vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embed a batch of text strings. Implementations may override for a
    /// single batched request.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Number of dimensions this encoder produces.
    fn dimensions(&self) -> usize;
}

/// Create the configured embedder.
pub fn create_embedder(
    config: &crate::config::EmbeddingConfig,
    api_key: String,
) -> remote::RemoteEmbedder {
    remote::RemoteEmbedder::new(
        config.base_url.clone(),
        config.model.clone(),
        api_key,
        config.dimensions,
    )
}
