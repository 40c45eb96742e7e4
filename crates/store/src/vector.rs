//! Vector similarity utilities.

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank `(item, embedding)` pairs by similarity to `query`.
///
/// Returns at most `limit` `(item, score)` pairs with strictly positive
/// similarity, best first. Ties keep insertion order.
pub fn rank_by_similarity<'a, T>(
    items: impl IntoIterator<Item = (&'a T, &'a [f32])>,
    query: &[f32],
    limit: usize,
) -> Vec<(&'a T, f32)>
where
    T: 'a,
{
    let mut scored: Vec<(&T, f32)> = items
        .into_iter()
        .map(|(item, emb)| (item, cosine_similarity(emb, query)))
        .filter(|(_, score)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}
