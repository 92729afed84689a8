//! Engine configuration.
//!
//! All tunables that were hardcoded in earlier iterations live here as named
//! defaults, so thresholds and batch sizes have a single source of truth
//! shared by the engine and its tests.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EngineResult};

/// Default tunables.
pub mod defaults {
    /// Minimum cosine similarity for cluster membership when the
    /// organization has no `cluster_threshold` or its lookup fails.
    pub const CLUSTER_THRESHOLD: f32 = 0.80;

    /// Minimum cosine similarity for similar-question lookups when the
    /// organization has no `similar_threshold` or its lookup fails.
    pub const SIMILAR_THRESHOLD: f32 = 0.50;

    /// Default result cap for `find_similar_questions`.
    pub const SIMILAR_LIMIT: usize = 10;

    /// Extra neighbors fetched beyond the limit, absorbing the source
    /// question's own hit and sub-threshold results.
    pub const SIMILAR_OVERFETCH: usize = 5;

    /// Questions embedded per batch.
    pub const EMBED_BATCH_SIZE: usize = 10;

    /// Concurrent embedding calls in flight within a batch.
    pub const MAX_CONCURRENT_EMBEDS: usize = 4;

    /// Answer preview length in chars.
    pub const ANSWER_PREVIEW_CHARS: usize = 150;

    /// Question-text truncation for vector index metadata.
    pub const METADATA_TEXT_CHARS: usize = 500;
}

/// Tunables for [`crate::engine::ClusterEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fallback cluster-membership threshold.
    pub default_cluster_threshold: f32,
    /// Fallback similar-question threshold.
    pub default_similar_threshold: f32,
    /// Default `find_similar_questions` result cap.
    pub default_similar_limit: usize,
    /// Neighbor over-fetch for similar-question queries.
    pub similar_overfetch: usize,
    /// Embedding batch size.
    pub embed_batch_size: usize,
    /// Embedding concurrency within a batch.
    pub max_concurrent_embeds: usize,
    /// Answer preview length in chars.
    pub answer_preview_chars: usize,
    /// Metadata text truncation in chars.
    pub metadata_text_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_cluster_threshold: defaults::CLUSTER_THRESHOLD,
            default_similar_threshold: defaults::SIMILAR_THRESHOLD,
            default_similar_limit: defaults::SIMILAR_LIMIT,
            similar_overfetch: defaults::SIMILAR_OVERFETCH,
            embed_batch_size: defaults::EMBED_BATCH_SIZE,
            max_concurrent_embeds: defaults::MAX_CONCURRENT_EMBEDS,
            answer_preview_chars: defaults::ANSWER_PREVIEW_CHARS,
            metadata_text_chars: defaults::METADATA_TEXT_CHARS,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration. Called once at engine construction.
    pub fn validate(&self) -> EngineResult<()> {
        for (field, value) in [
            ("default_cluster_threshold", self.default_cluster_threshold),
            ("default_similar_threshold", self.default_similar_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: format!("must be in [0, 1], got {value}"),
                }
                .into());
            }
        }
        for (field, value) in [
            ("default_similar_limit", self.default_similar_limit),
            ("embed_batch_size", self.embed_batch_size),
            ("max_concurrent_embeds", self.max_concurrent_embeds),
            ("answer_preview_chars", self.answer_preview_chars),
            ("metadata_text_chars", self.metadata_text_chars),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: "must be at least 1".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}
