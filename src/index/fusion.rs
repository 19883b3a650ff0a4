use std::collections::HashMap;

/// Constant `k` in the RRF formula: `weight / (k + rank)`.
const RRF_K: f64 = 60.0;

/// Merge lexical and vector result lists using weighted Reciprocal Rank
/// Fusion.
///
/// Each input is a list of `(chunk_index, score)` pairs already sorted by
/// descending score. The rank-based RRF contribution of each list is
/// scaled by its weight, summed per chunk, and the merged list is returned
/// sorted by total score, truncated to `limit`.
pub fn merge_results(
    lexical: &[(usize, f64)],
    vector: &[(usize, f64)],
    lexical_weight: f64,
    vector_weight: f64,
    limit: usize,
) -> Vec<(usize, f64)> {
    let mut scores: HashMap<usize, f64> = HashMap::new();

    for (rank, &(id, _score)) in lexical.iter().enumerate() {
        let rrf = lexical_weight / (RRF_K + (rank as f64 + 1.0));
        *scores.entry(id).or_default() += rrf;
    }

    for (rank, &(id, _score)) in vector.iter().enumerate() {
        let rrf = vector_weight / (RRF_K + (rank as f64 + 1.0));
        *scores.entry(id).or_default() += rrf;
    }

    let mut merged: Vec<(usize, f64)> = scores.into_iter().collect();
    merged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(limit);
    merged
}
