//! Cluster records and engine result shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::Question;

/// A non-master entry in a cluster's member list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    /// The member question's id.
    pub question_id: Uuid,
    /// The member question's text at attach time.
    pub text: String,
    /// Cosine similarity to the cluster master.
    pub similarity: f32,
    /// Whether an answer exists for this question.
    ///
    /// Stale by design in the persisted record; re-derived from the answer
    /// store at read time by `list_clusters`.
    pub has_answer: bool,
}

/// A persisted group of semantically near-duplicate questions.
///
/// Created by the reconciliation controller, never replaced or deleted.
/// `members` holds the non-master members only and is append-only across
/// runs; the master is carried by `master_question_id` / `master_text`.
/// `question_count` counts the members plus the master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique cluster identifier.
    pub cluster_id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// The canonical representative's question id.
    pub master_question_id: Uuid,
    /// The canonical representative's text.
    pub master_text: String,
    /// Non-master members, append-only.
    pub members: Vec<ClusterMember>,
    /// Mean similarity of non-master members to the master.
    pub avg_similarity: f32,
    /// Total questions in the cluster (members + master), always >= 2.
    pub question_count: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last append timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Cluster {
    /// Build a freshly formed cluster record.
    pub fn new(
        cluster_id: Uuid,
        project_id: Uuid,
        master_question_id: Uuid,
        master_text: impl Into<String>,
        members: Vec<ClusterMember>,
        avg_similarity: f32,
    ) -> Self {
        let now = Utc::now();
        let question_count = members.len() + 1;
        Self {
            cluster_id,
            project_id,
            master_question_id,
            master_text: master_text.into(),
            members,
            avg_similarity,
            question_count,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of a `reconcile_clusters` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// All project questions, ordered: masters by text length descending,
    /// then unclustered in input order, then non-master members in input
    /// order. Downstream answer generation processes one representative per
    /// cluster first.
    pub questions: Vec<Question>,
    /// Total questions loaded for the project.
    pub total_count: usize,
    /// Clusters newly formed by this run (attachments to existing clusters
    /// do not count).
    pub clusters_created: usize,
}

/// A neighbor returned by `find_similar_questions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarQuestion {
    /// The neighbor question's id.
    pub question_id: Uuid,
    /// The neighbor question's current text.
    pub text: String,
    /// Cosine similarity score from the vector index.
    pub similarity: f32,
    /// Whether an answer exists for the neighbor.
    pub has_answer: bool,
    /// First 150 chars of the answer, with "..." when truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_preview: Option<String>,
    /// Whether the neighbor shares the source question's cluster.
    pub in_same_cluster: bool,
}
