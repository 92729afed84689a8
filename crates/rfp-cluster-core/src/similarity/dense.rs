//! Dense vector similarity primitives.
//!
//! Cosine similarity here follows the engine's convention for degenerate
//! input: empty, length-mismatched, or zero-magnitude vectors compare as
//! 0.0 rather than erroring. Question embeddings that reach this module
//! have already passed the provider, so a degenerate vector is a neutral
//! non-match, not a failure.

/// L2 norm (magnitude) of a vector.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize a vector to unit length in place.
///
/// Zero-magnitude vectors are left unchanged.
#[inline]
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[inline]
fn dot_product_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity between two dense vectors, clamped to [-1, 1].
///
/// Returns 0.0 for empty, length-mismatched, or zero-magnitude input.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }
    (dot_product_unchecked(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
