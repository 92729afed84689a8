//! The clustering engine: reconciliation controller, similar-question query
//! service, and the read-only cluster listing.
//!
//! `ClusterEngine` is a stateless orchestrator over explicitly injected
//! collaborators. Each public operation is a self-contained batch job:
//! callers serialize reconciliation per project; there is no internal lock
//! and no mid-run cancellation — a run either completes or raises.

mod query;
mod reconcile;

use std::sync::Arc;

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::traits::{
    AnswerStore, ClusterRepository, EmbeddingProvider, QuestionRepository, VectorIndex,
};
use crate::types::Cluster;

/// Incremental semantic question-clustering engine.
///
/// Maintains stable clusters of near-duplicate questions over a monotonically
/// growing per-project dataset. All collaborators are injected; the engine
/// holds no other state, so one instance can serve any number of projects.
pub struct ClusterEngine {
    embeddings: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
    questions: Arc<dyn QuestionRepository>,
    clusters: Arc<dyn ClusterRepository>,
    answers: Arc<dyn AnswerStore>,
    config: EngineConfig,
}

impl ClusterEngine {
    /// Construct an engine over the given collaborators.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] when the configuration is invalid.
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
        questions: Arc<dyn QuestionRepository>,
        clusters: Arc<dyn ClusterRepository>,
        answers: Arc<dyn AnswerStore>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            embeddings,
            vector_index,
            questions,
            clusters,
            answers,
            config,
        })
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// List a project's clusters, largest first.
    ///
    /// Each member's `has_answer` is re-derived from the answer store at
    /// read time; the persisted flag is allowed to go stale between runs.
    pub async fn list_clusters(&self, project_id: Uuid) -> EngineResult<Vec<Cluster>> {
        if project_id.is_nil() {
            return Err(EngineError::Validation("project_id is nil".into()));
        }

        let mut clusters = Vec::new();
        let mut token = None;
        loop {
            let page = self.clusters.list_clusters(project_id, token).await?;
            clusters.extend(page.items);
            token = page.next_token;
            if token.is_none() {
                break;
            }
        }

        for cluster in &mut clusters {
            for member in &mut cluster.members {
                member.has_answer = self
                    .answers
                    .answer_text(project_id, member.question_id)
                    .await?
                    .is_some();
            }
        }

        clusters.sort_by(|a, b| b.question_count.cmp(&a.question_count));
        Ok(clusters)
    }
}

/// First `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Answer preview: first `max_chars` characters plus "..." when truncated.
pub(crate) fn answer_preview(text: &str, max_chars: usize) -> String {
    let mut preview = truncate_chars(text, max_chars);
    if text.chars().count() > max_chars {
        preview.push_str("...");
    }
    preview
}
