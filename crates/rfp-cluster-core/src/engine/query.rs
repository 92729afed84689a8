//! Ad-hoc similar-question lookup, independent of persisted clusters.

use std::cmp::Ordering;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{answer_preview, ClusterEngine};
use crate::error::{EngineError, EngineResult};
use crate::traits::VectorFilter;
use crate::types::SimilarQuestion;

impl ClusterEngine {
    /// Find the top-`limit` questions most similar to one source question.
    ///
    /// An explicit `threshold` always wins and skips the org-settings lookup
    /// entirely; otherwise the organization's `similar_threshold` applies,
    /// falling back silently to the configured default on lookup failure.
    /// The boundary is inclusive: a score exactly at the threshold survives.
    ///
    /// Vector-index hits whose question no longer exists in the repository
    /// (stale vectors) are dropped silently; their rate is logged.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] on nil ids.
    /// - [`EngineError::QuestionNotFound`] when the source question is
    ///   absent or has empty text.
    /// - [`EngineError::Upstream`] on embedding, vector-index, or repository
    ///   failure.
    pub async fn find_similar_questions(
        &self,
        project_id: Uuid,
        question_id: Uuid,
        threshold: Option<f32>,
        limit: Option<usize>,
    ) -> EngineResult<Vec<SimilarQuestion>> {
        if project_id.is_nil() {
            return Err(EngineError::Validation("project_id is nil".into()));
        }
        if question_id.is_nil() {
            return Err(EngineError::Validation("question_id is nil".into()));
        }

        let source = self
            .questions
            .get_question(project_id, question_id)
            .await?
            .ok_or(EngineError::QuestionNotFound(question_id))?;
        if source.text.trim().is_empty() {
            return Err(EngineError::QuestionNotFound(question_id));
        }

        let limit = limit.unwrap_or(self.config().default_similar_limit);
        let threshold = match threshold {
            Some(explicit) => explicit,
            None => self.resolve_similar_threshold(source.org_id).await,
        };

        let vector = self.embeddings.embed(&source.text).await?;
        let matches = self
            .vector_index
            .query(
                source.org_id,
                &vector,
                limit + self.config().similar_overfetch,
                VectorFilter::questions(project_id),
            )
            .await?;

        let candidates: Vec<_> = matches
            .into_iter()
            .filter(|m| m.id != question_id)
            .filter(|m| m.score >= threshold)
            .take(limit)
            .collect();

        let mut similar = Vec::with_capacity(candidates.len());
        let mut stale = 0usize;
        for candidate in candidates {
            let Some(question) = self
                .questions
                .get_question(project_id, candidate.id)
                .await?
            else {
                // Vector still in the index for a deleted question.
                stale += 1;
                continue;
            };
            let answer = self
                .answers
                .answer_text(project_id, question.question_id)
                .await?;
            let in_same_cluster = match (source.cluster_id, question.cluster_id) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            similar.push(SimilarQuestion {
                question_id: question.question_id,
                text: question.text,
                similarity: candidate.score,
                has_answer: answer.is_some(),
                answer_preview: answer
                    .map(|a| answer_preview(&a, self.config().answer_preview_chars)),
                in_same_cluster,
            });
        }

        if stale > 0 {
            warn!(
                %project_id,
                %question_id,
                stale,
                "dropped stale vector index matches"
            );
        }

        similar.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        Ok(similar)
    }

    /// Resolve the similar-question threshold from org settings, silently
    /// falling back to the configured default.
    async fn resolve_similar_threshold(&self, org_id: Uuid) -> f32 {
        match self.questions.get_organization_settings(org_id).await {
            Ok(settings) => settings
                .similar_threshold
                .unwrap_or(self.config().default_similar_threshold),
            Err(err) => {
                debug!(
                    %org_id,
                    error = %err,
                    "organization settings lookup failed, using default similar threshold"
                );
                self.config().default_similar_threshold
            }
        }
    }
}
