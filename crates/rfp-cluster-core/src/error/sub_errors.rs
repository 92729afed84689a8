//! Sub-error types for rfp-cluster-core.
//!
//! Each error type covers a specific domain of failures.

use thiserror::Error;

// ============================================================================
// UPSTREAM ERROR
// ============================================================================

/// Failures in external collaborators.
///
/// Any of these aborts the current run. All are retry-safe: reruns skip
/// already-clustered questions, so re-invocation never duplicates writes.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Embedding provider call failed.
    #[error("Embedding failed: {reason}")]
    Embedding {
        /// Detailed reason for failure
        reason: String,
    },

    /// Vector index operation failed.
    #[error("Vector index {operation} failed: {reason}")]
    VectorIndex {
        /// Operation that failed ("upsert" or "query")
        operation: String,
        /// Detailed reason for failure
        reason: String,
    },

    /// Question or cluster repository operation failed.
    #[error("Repository {operation} failed: {reason}")]
    Repository {
        /// Operation that failed
        operation: String,
        /// Detailed reason for failure
        reason: String,
    },
}

// ============================================================================
// CONFIG ERROR
// ============================================================================

/// Engine configuration errors.
///
/// Raised by [`crate::config::EngineConfig::validate`] at construction time,
/// never mid-run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration value is invalid.
    #[error("Invalid configuration: {field}: {reason}")]
    Invalid {
        /// Configuration field name
        field: String,
        /// Reason why it's invalid
        reason: String,
    },
}
