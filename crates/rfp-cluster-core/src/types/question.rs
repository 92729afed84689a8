//! Question record and the cluster-annotation write shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// A free-text question extracted from an RFP document.
///
/// Created by the external extraction pipeline with no cluster fields set.
/// The reconciliation controller is the only writer of the cluster-annotation
/// fields (`cluster_id`, `is_cluster_master`, `similarity_to_master`,
/// `master_question_id`): it attaches them on first match and never rewrites
/// them afterwards.
///
/// # Invariants
///
/// - A question belongs to at most one cluster.
/// - A master has `similarity_to_master` = 1.0 and references itself via
///   `master_question_id`.
/// - A non-master member's `master_question_id` references the cluster's
///   master.
/// - Orphans have all four annotation fields unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique question identifier.
    pub question_id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Owning organization (vector index namespace).
    pub org_id: Uuid,
    /// Raw question text.
    pub text: String,
    /// Source document section, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<Uuid>,
    /// Human-readable section title, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    /// Cluster this question belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<Uuid>,
    /// Whether this question is its cluster's canonical representative.
    #[serde(default)]
    pub is_cluster_master: bool,
    /// Cosine similarity to the cluster master (1.0 for the master itself).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_to_master: Option<f32>,
    /// The cluster master's question id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_question_id: Option<Uuid>,
}

impl Question {
    /// Create an unclustered question, the shape the extraction pipeline
    /// produces.
    pub fn new(question_id: Uuid, project_id: Uuid, org_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            question_id,
            project_id,
            org_id,
            text: text.into(),
            section_id: None,
            section_title: None,
            cluster_id: None,
            is_cluster_master: false,
            similarity_to_master: None,
            master_question_id: None,
        }
    }

    /// Whether the question has been assigned to a cluster.
    pub fn is_clustered(&self) -> bool {
        self.cluster_id.is_some()
    }

    /// Text length in Unicode scalar values, the measure used for master
    /// selection and output ordering.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Validate identifiers at the repository boundary.
    pub fn validate(&self) -> EngineResult<()> {
        if self.question_id.is_nil() {
            return Err(EngineError::Validation("question_id is nil".into()));
        }
        if self.project_id.is_nil() {
            return Err(EngineError::Validation("project_id is nil".into()));
        }
        if self.org_id.is_nil() {
            return Err(EngineError::Validation("org_id is nil".into()));
        }
        Ok(())
    }

    /// Apply a cluster-annotation write to this record.
    pub fn apply_cluster_fields(&mut self, update: &ClusterFieldUpdate) {
        self.cluster_id = Some(update.cluster_id);
        self.is_cluster_master = update.is_cluster_master;
        self.similarity_to_master = Some(update.similarity_to_master);
        self.master_question_id = Some(update.master_question_id);
    }
}

/// The only write shape for cluster-annotation fields on a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterFieldUpdate {
    /// Cluster being attached.
    pub cluster_id: Uuid,
    /// Whether the question becomes the cluster master.
    pub is_cluster_master: bool,
    /// Similarity to the master (1.0 when the question IS the master).
    pub similarity_to_master: f32,
    /// The cluster master's question id.
    pub master_question_id: Uuid,
}

impl ClusterFieldUpdate {
    /// Annotation for the cluster master itself.
    pub fn master(cluster_id: Uuid, master_question_id: Uuid) -> Self {
        Self {
            cluster_id,
            is_cluster_master: true,
            similarity_to_master: 1.0,
            master_question_id,
        }
    }

    /// Annotation for a non-master member.
    pub fn member(cluster_id: Uuid, master_question_id: Uuid, similarity: f32) -> Self {
        Self {
            cluster_id,
            is_cluster_master: false,
            similarity_to_master: similarity,
            master_question_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str) -> Question {
        Question::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), text)
    }

    #[test]
    fn new_question_is_orphan() {
        let q = question("What is your uptime SLA?");
        assert!(!q.is_clustered());
        assert!(!q.is_cluster_master);
        assert!(q.similarity_to_master.is_none());
        assert!(q.master_question_id.is_none());
    }

    #[test]
    fn master_update_sets_self_reference() {
        let mut q = question("Describe your data retention policy.");
        let cluster_id = Uuid::new_v4();
        q.apply_cluster_fields(&ClusterFieldUpdate::master(cluster_id, q.question_id));
        assert!(q.is_cluster_master);
        assert_eq!(q.cluster_id, Some(cluster_id));
        assert_eq!(q.similarity_to_master, Some(1.0));
        assert_eq!(q.master_question_id, Some(q.question_id));
    }

    #[test]
    fn member_update_references_master() {
        let mut q = question("How long do you retain data?");
        let cluster_id = Uuid::new_v4();
        let master_id = Uuid::new_v4();
        q.apply_cluster_fields(&ClusterFieldUpdate::member(cluster_id, master_id, 0.87));
        assert!(!q.is_cluster_master);
        assert_eq!(q.master_question_id, Some(master_id));
        assert_eq!(q.similarity_to_master, Some(0.87));
    }

    #[test]
    fn nil_ids_fail_validation() {
        let mut q = question("text");
        q.question_id = Uuid::nil();
        assert!(matches!(q.validate(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn text_len_counts_chars_not_bytes() {
        let q = question("héllo");
        assert_eq!(q.text_len(), 5);
        assert_eq!(q.text.len(), 6);
    }

    #[test]
    fn serde_roundtrip_preserves_optional_fields() {
        let mut q = question("What encryption do you use at rest?");
        q.apply_cluster_fields(&ClusterFieldUpdate::member(
            Uuid::new_v4(),
            Uuid::new_v4(),
            0.91,
        ));
        let json = serde_json::to_string(&q).unwrap();
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
