//! Similarity engine: cosine primitives and deterministic threshold
//! grouping.
//!
//! The grouping algorithm is pure and order-deterministic: the same inputs
//! in the same order always produce the same clusters, masters, and output
//! ordering. That determinism is what keeps repeated reconciliation runs
//! idempotent.

pub mod dense;
mod engine;

pub use engine::{
    group_by_threshold, order_for_output, DraftCluster, DraftMember, EmbeddedQuestion,
    GroupingResult,
};
