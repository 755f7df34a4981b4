//! Similarity engine
//!
//! Pure functions over embedding vectors. Degenerate input (empty,
//! mismatched, or zero-magnitude vectors) yields the neutral similarity
//! 0.0 instead of an error.

/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// Returns 0.0 for empty, length-mismatched, or zero-magnitude input.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        tracing::warn!(
            len_a = a.len(),
            len_b = b.len(),
            "invalid vectors for cosine similarity"
        );
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// A vector is usable for comparison when it is non-empty and not all
/// zeros.
#[must_use]
pub fn is_valid_vector(vec: &[f32]) -> bool {
    !vec.is_empty() && vec.iter().any(|v| *v != 0.0)
}
