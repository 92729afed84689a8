//! Top-level unified error type for the clustering engine.

use thiserror::Error;
use uuid::Uuid;

use super::sub_errors::{ConfigError, UpstreamError};

// ============================================================================
// TOP-LEVEL UNIFIED ERROR TYPE
// ============================================================================

/// Top-level unified error type for the clustering engine.
///
/// # Recoverability
///
/// - `Upstream`: retry-safe. A rerun of `reconcile_clusters` skips questions
///   that were clustered before the failure (at-least-once semantics).
/// - `Validation` / `NotFound`: caller fault or terminal; retrying the same
///   call yields the same error.
/// - `Config`: construction-time; fix the configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input validation failed (missing or nil identifiers).
    ///
    /// Caller fault; not retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Project not found, or project has no organization.
    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    /// Question not found (or has empty text where text is required).
    #[error("Question not found: {0}")]
    QuestionNotFound(Uuid),

    /// External collaborator failure.
    ///
    /// Aborts the current run; committed writes persist.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Engine configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Whether re-invoking the failed operation can succeed.
    ///
    /// Only upstream failures are retryable; reconciliation is idempotent at
    /// per-question granularity, so a rerun after an upstream failure resumes
    /// where the previous run stopped.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_is_retryable() {
        let err = EngineError::Upstream(UpstreamError::Embedding {
            reason: "connection reset".into(),
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn not_found_is_terminal() {
        let err = EngineError::ProjectNotFound(Uuid::new_v4());
        assert!(!err.is_retryable());
        let err = EngineError::Validation("nil project id".into());
        assert!(!err.is_retryable());
    }

    #[test]
    fn display_includes_context() {
        let err = EngineError::Upstream(UpstreamError::VectorIndex {
            operation: "query".into(),
            reason: "timeout".into(),
        });
        let msg = err.to_string();
        assert!(msg.contains("query"));
        assert!(msg.contains("timeout"));
    }
}
