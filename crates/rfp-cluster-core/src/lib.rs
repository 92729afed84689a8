//! Incremental semantic question-clustering engine.
//!
//! Given a growing per-project set of free-text questions extracted from RFP
//! documents, this crate maintains stable clusters of near-duplicate
//! questions so answer generation happens once per cluster and answers can
//! be reused across duplicates.
//!
//! # Architecture
//!
//! - Domain types ([`types::Question`], [`types::Cluster`])
//! - Collaborator traits for the external systems
//!   ([`traits::EmbeddingProvider`], [`traits::VectorIndex`],
//!   [`traits::QuestionRepository`], [`traits::ClusterRepository`],
//!   [`traits::AnswerStore`])
//! - The deterministic similarity engine ([`similarity`])
//! - The orchestrating [`engine::ClusterEngine`] with its three operations:
//!   `reconcile_clusters`, `find_similar_questions`, `list_clusters`
//! - In-memory stubs for tests ([`stubs`])
//!
//! # Idempotence
//!
//! Reconciliation is idempotent at per-question granularity: clustered
//! questions are skipped on reruns, clusters only grow (additive member
//! appends), and grouping is order-deterministic. A run that fails upstream
//! is safe to retry — at-least-once, not exactly-once.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rfp_cluster_core::{ClusterEngine, EngineConfig};
//! use rfp_cluster_core::stubs::{
//!     InMemoryClusterRepository, InMemoryQuestionRepository, InMemoryVectorIndex,
//!     StubAnswerStore, StubEmbeddingProvider,
//! };
//!
//! let engine = ClusterEngine::new(
//!     Arc::new(StubEmbeddingProvider::new(8)),
//!     Arc::new(InMemoryVectorIndex::new()),
//!     Arc::new(InMemoryQuestionRepository::new()),
//!     Arc::new(InMemoryClusterRepository::new()),
//!     Arc::new(StubAnswerStore::new()),
//!     EngineConfig::default(),
//! ).unwrap();
//! # let _ = engine;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod similarity;
pub mod stubs;
pub mod traits;
pub mod types;

pub use config::EngineConfig;
pub use engine::ClusterEngine;
pub use error::{EngineError, EngineResult};
pub use types::{Cluster, ClusterMember, Question, ReconcileOutcome, SimilarQuestion};
