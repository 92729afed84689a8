//! Collaborator traits for the clustering engine.
//!
//! These are the seams to the external systems the engine orchestrates:
//! embedding provider, per-organization vector index, question repository
//! (source of truth), cluster repository, and the downstream answer store.
//! All implementations must be thread-safe (`Send + Sync`) and are injected
//! explicitly into [`crate::engine::ClusterEngine`] — no module-level
//! globals.
//!
//! Retry and backoff are the collaborators' concern: every method is a
//! bounded RPC relying on provider-side timeouts.

mod answer_store;
mod cluster_repository;
mod embedding_provider;
mod question_repository;
mod vector_index;

pub use answer_store::AnswerStore;
pub use cluster_repository::{ClusterPage, ClusterRepository};
pub use embedding_provider::EmbeddingProvider;
pub use question_repository::{
    OrganizationSettings, ProjectRecord, QuestionPage, QuestionRepository,
};
pub use vector_index::{VectorFilter, VectorIndex, VectorMatch, VectorMetadata, RECORD_TYPE_QUESTION};
