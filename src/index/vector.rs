use ndarray::Array1;

/// In-memory dense-vector index over a fixed set of chunk embeddings.
///
/// Vectors are L2-normalized at build time so cosine similarity reduces
/// to a dot product. Search is a brute-force scan; per-session corpora
/// are small enough that approximate structures would not pay for
/// themselves.
pub struct VectorIndex {
    vectors: Vec<Array1<f64>>,
}

impl VectorIndex {
    pub fn build(embeddings: Vec<Vec<f64>>) -> Self {
        let vectors = embeddings
            .into_iter()
            .map(|v| normalize(Array1::from_vec(v)))
            .collect();
        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Width of the stored embeddings; 0 when the index is empty.
    pub fn dim(&self) -> usize {
        self.vectors.first().map(|v| v.len()).unwrap_or(0)
    }

    /// Maximal Marginal Relevance search.
    ///
    /// Takes the `fetch` most similar vectors to `query`, then greedily
    /// re-orders them trading off query relevance against redundancy with
    /// already-selected results:
    ///
    /// ```text
    /// mmr = lambda * sim(query, d) - (1 - lambda) * max_sim(d, selected)
    /// ```
    ///
    /// `lambda` = 1.0 degenerates to plain similarity order. Returns
    /// `(chunk_index, query_similarity)` pairs in selection order.
    pub fn search_mmr(&self, query: &[f64], fetch: usize, lambda: f64) -> Vec<(usize, f64)> {
        if self.is_empty() || query.is_empty() {
            return Vec::new();
        }

        let query = normalize(Array1::from_vec(query.to_vec()));

        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.dot(&query)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(fetch);

        let mut candidates = scored;
        let mut selected: Vec<(usize, f64)> = Vec::with_capacity(candidates.len());

        while !candidates.is_empty() {
            let mut best_pos = 0;
            let mut best_mmr = f64::NEG_INFINITY;
            for (pos, &(idx, relevance)) in candidates.iter().enumerate() {
                let redundancy = selected
                    .iter()
                    .map(|&(sel_idx, _)| self.vectors[idx].dot(&self.vectors[sel_idx]))
                    .fold(0.0, f64::max);
                let mmr = lambda * relevance - (1.0 - lambda) * redundancy;
                if mmr > best_mmr {
                    best_mmr = mmr;
                    best_pos = pos;
                }
            }
            selected.push(candidates.remove(best_pos));
        }

        selected
    }
}

fn normalize(v: Array1<f64>) -> Array1<f64> {
    let norm = v.dot(&v).sqrt();
    if norm > 0.0 {
        v / norm
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_returns_nothing() {
        let index = VectorIndex::build(Vec::new());
        assert!(index.search_mmr(&[1.0, 0.0], 10, 0.7).is_empty());
    }

    #[test]
    fn most_similar_vector_comes_first() {
        let index = VectorIndex::build(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.9, 0.1, 0.0],
        ]);
        let results = index.search_mmr(&[1.0, 0.0, 0.0], 10, 1.0);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fetch_bounds_candidate_pool() {
        let index = VectorIndex::build(vec![vec![1.0, 0.0]; 20]);
        let results = index.search_mmr(&[1.0, 0.0], 5, 0.7);
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn mmr_promotes_diversity() {
        // Two near-duplicates of the query and one orthogonal vector.
        let index = VectorIndex::build(vec![
            vec![1.0, 0.0],
            vec![0.999, 0.001],
            vec![0.0, 1.0],
        ]);
        // With heavy diversity weighting the orthogonal vector beats the
        // duplicate for second place.
        let results = index.search_mmr(&[1.0, 0.0], 3, 0.3);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 2);
    }

    #[test]
    fn lambda_one_is_pure_relevance_order() {
        let index = VectorIndex::build(vec![
            vec![1.0, 0.0],
            vec![0.999, 0.001],
            vec![0.0, 1.0],
        ]);
        let results = index.search_mmr(&[1.0, 0.0], 3, 1.0);
        let order: Vec<usize> = results.iter().map(|r| r.0).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn zero_vector_does_not_panic() {
        let index = VectorIndex::build(vec![vec![0.0, 0.0]]);
        let results = index.search_mmr(&[1.0, 0.0], 10, 0.7);
        assert_eq!(results.len(), 1);
    }
}
