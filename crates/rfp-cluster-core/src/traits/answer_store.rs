//! Answer store trait: read-only access to downstream answers.
//!
//! Answer generation itself is out of scope for this engine; the store is
//! consulted only to enrich results with `has_answer` flags and previews.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineResult;

/// Trait for the downstream answer store.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Full answer text for a question, `None` when no answer exists yet.
    async fn answer_text(
        &self,
        project_id: Uuid,
        question_id: Uuid,
    ) -> EngineResult<Option<String>>;
}
