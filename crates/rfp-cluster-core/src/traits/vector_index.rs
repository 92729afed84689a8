//! Vector index trait: nearest-neighbor search over question embeddings.
//!
//! The index is namespaced per organization; the namespace travels as an
//! explicit argument rather than living in an ambient singleton client.
//! The index may reference questions that were since deleted from the
//! question repository — callers treat such matches as a data-quality
//! condition and filter them silently.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;

/// Metadata record type for question vectors.
pub const RECORD_TYPE_QUESTION: &str = "question";

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    /// Record discriminator, [`RECORD_TYPE_QUESTION`] for question vectors.
    pub record_type: String,
    /// Owning project.
    pub project_id: Uuid,
    /// The question this vector embeds.
    pub question_id: Uuid,
    /// Truncated question text, for index-side inspection only.
    pub text_preview: String,
}

/// Metadata filter applied to queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorFilter {
    /// Required record type.
    pub record_type: String,
    /// Required project.
    pub project_id: Uuid,
}

impl VectorFilter {
    /// Filter selecting question vectors of one project.
    pub fn questions(project_id: Uuid) -> Self {
        Self {
            record_type: RECORD_TYPE_QUESTION.to_string(),
            project_id,
        }
    }
}

/// A single query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// The matched vector's id (a question id for question vectors).
    pub id: Uuid,
    /// Similarity score in the index's scale (cosine, [0, 1] in practice).
    pub score: f32,
    /// Metadata stored with the vector, when the index returns it.
    pub metadata: Option<VectorMetadata>,
}

/// Trait for the external nearest-neighbor index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite a vector under the organization namespace.
    async fn upsert(
        &self,
        org_id: Uuid,
        id: Uuid,
        vector: Vec<f32>,
        metadata: VectorMetadata,
    ) -> EngineResult<()>;

    /// Return the `top_k` nearest vectors matching `filter`, best first.
    async fn query(
        &self,
        org_id: Uuid,
        vector: &[f32],
        top_k: usize,
        filter: VectorFilter,
    ) -> EngineResult<Vec<VectorMatch>>;
}
