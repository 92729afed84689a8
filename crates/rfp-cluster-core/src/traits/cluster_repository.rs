//! Cluster repository trait: persisted cluster records.
//!
//! Clusters are created and grown, never replaced or deleted. Growing a
//! cluster must be an additive operation (atomic list-append plus counter
//! increment) so concurrent appenders never lose updates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::types::{Cluster, ClusterMember};

/// One page of a paginated cluster listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterPage {
    /// Clusters on this page.
    pub items: Vec<Cluster>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

/// Trait for the external cluster store.
#[async_trait]
pub trait ClusterRepository: Send + Sync {
    /// Persist a newly formed cluster.
    async fn create_cluster(&self, cluster: Cluster) -> EngineResult<()>;

    /// Append one member to an existing cluster and increment its question
    /// count. Must never rewrite the full record.
    async fn append_member(&self, cluster_id: Uuid, member: ClusterMember) -> EngineResult<()>;

    /// List one page of a project's clusters.
    async fn list_clusters(
        &self,
        project_id: Uuid,
        token: Option<String>,
    ) -> EngineResult<ClusterPage>;
}
