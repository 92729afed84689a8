//! Domain types for the question-clustering engine.
//!
//! Records are explicit tagged structures with required vs. optional fields;
//! validation happens at the repository boundary via [`Question::validate`].
//! Embeddings are transient: they never appear on any persisted type here,
//! only inside a run and in the external vector index.

mod cluster;
mod question;

pub use cluster::{Cluster, ClusterMember, ReconcileOutcome, SimilarQuestion};
pub use question::{ClusterFieldUpdate, Question};
