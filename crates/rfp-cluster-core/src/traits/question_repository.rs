//! Question repository trait: the paginated source of truth for questions,
//! plus project and organization-settings lookups.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::types::{ClusterFieldUpdate, Question};

/// Minimal project record, enough to resolve the organization namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project identifier.
    pub project_id: Uuid,
    /// Owning organization. Absent on malformed records; the engine treats
    /// a missing org the same as a missing project.
    pub org_id: Option<Uuid>,
}

/// Per-organization clustering settings.
///
/// Both thresholds are optional; the engine falls back to its configured
/// defaults when a threshold is unset or the lookup fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    /// Minimum cosine similarity for cluster membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_threshold: Option<f32>,
    /// Minimum cosine similarity for ad-hoc similar-question lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_threshold: Option<f32>,
}

/// One page of a paginated question listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPage {
    /// Questions on this page, in stable repository order.
    pub items: Vec<Question>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

/// Trait for the external question store.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Look up a project. `None` when the project does not exist.
    async fn get_project(&self, project_id: Uuid) -> EngineResult<Option<ProjectRecord>>;

    /// List one page of a project's questions.
    ///
    /// Callers must fully drain: loop until `next_token` is `None`.
    async fn list_questions(
        &self,
        project_id: Uuid,
        token: Option<String>,
    ) -> EngineResult<QuestionPage>;

    /// Load an organization's clustering settings.
    ///
    /// Failures here never abort a run: the engine logs and falls back to
    /// default thresholds.
    async fn get_organization_settings(&self, org_id: Uuid) -> EngineResult<OrganizationSettings>;

    /// Load a single question. `None` when absent.
    async fn get_question(
        &self,
        project_id: Uuid,
        question_id: Uuid,
    ) -> EngineResult<Option<Question>>;

    /// Persist cluster-annotation fields on a question.
    ///
    /// This is the only write the engine performs on questions.
    async fn update_cluster_fields(
        &self,
        project_id: Uuid,
        question_id: Uuid,
        fields: ClusterFieldUpdate,
    ) -> EngineResult<()>;
}
