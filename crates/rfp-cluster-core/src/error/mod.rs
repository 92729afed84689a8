//! Error types for rfp-cluster-core.
//!
//! This module defines the error taxonomy used throughout the engine:
//!
//! - [`EngineError`]: top-level unified error for all engine operations
//! - Sub-error types: [`UpstreamError`], [`ConfigError`]
//!
//! Callers see exactly one terminal failure per call. Recovery relies on
//! idempotent re-invocation of `reconcile_clusters`, never on rollback:
//! upstream failures abort the current run, and already-committed
//! per-question and per-cluster writes persist.
//!
//! Organization-settings lookup failures are deliberately NOT part of this
//! taxonomy's surface: the engine recovers locally with a default threshold
//! and a warning instead of aborting.

mod sub_errors;
mod unified;

pub use sub_errors::{ConfigError, UpstreamError};
pub use unified::{EngineError, EngineResult};
