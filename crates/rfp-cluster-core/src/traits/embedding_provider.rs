//! Embedding provider trait for text-to-vector conversion.
//!
//! Implementations include [`crate::stubs::StubEmbeddingProvider`]
//! (deterministic test embeddings) and real remote providers.
//!
//! Errors propagate immediately; the engine never falls back to fake
//! embeddings.

use async_trait::async_trait;

use crate::error::EngineResult;

/// Trait for embedding generation.
///
/// Converts question text to a fixed-length dense vector. Embeddings are
/// transient: the engine holds them only for the duration of a run and
/// inside the external vector index.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text.
    ///
    /// # Errors
    ///
    /// [`crate::error::UpstreamError::Embedding`] wrapped in
    /// [`crate::error::EngineError::Upstream`] on provider failure; this
    /// aborts the current reconciliation run.
    async fn embed(&self, text: &str) -> EngineResult<Vec<f32>>;

    /// Output dimension of the vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// Model identifier, for logging.
    fn model_id(&self) -> &str;
}
