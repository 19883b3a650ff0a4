use std::collections::HashMap;

/// BM25 term-frequency saturation parameter.
const K1: f64 = 1.2;

/// BM25 document-length normalization parameter.
const B: f64 = 0.75;

/// In-memory BM25 index over a fixed set of chunk texts.
///
/// Built once per upload and immutable afterwards; a re-upload builds a
/// whole new index. Scores use the standard Okapi BM25 formulation with
/// k1 = 1.2, b = 0.75.
pub struct Bm25Index {
    /// Term frequencies per document.
    term_freqs: Vec<HashMap<String, u32>>,
    /// Document lengths in tokens.
    doc_lens: Vec<f64>,
    /// Document frequency per term.
    doc_freqs: HashMap<String, u32>,
    avg_doc_len: f64,
}

impl Bm25Index {
    pub fn build<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut term_freqs = Vec::new();
        let mut doc_lens = Vec::new();
        let mut doc_freqs: HashMap<String, u32> = HashMap::new();

        for text in texts {
            let tokens = tokenize(text);
            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *freqs.entry(token.clone()).or_default() += 1;
            }
            for term in freqs.keys() {
                *doc_freqs.entry(term.clone()).or_default() += 1;
            }
            doc_lens.push(tokens.len() as f64);
            term_freqs.push(freqs);
        }

        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<f64>() / doc_lens.len() as f64
        };

        Self {
            term_freqs,
            doc_lens,
            doc_freqs,
            avg_doc_len,
        }
    }

    pub fn len(&self) -> usize {
        self.term_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.term_freqs.is_empty()
    }

    /// Score every document against `query` and return the top `limit`
    /// matches as `(chunk_index, score)` pairs, descending, zero-score
    /// documents omitted.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(usize, f64)> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || self.is_empty() {
            return Vec::new();
        }

        let n = self.len() as f64;
        let mut scored: Vec<(usize, f64)> = Vec::new();

        for (doc_idx, freqs) in self.term_freqs.iter().enumerate() {
            let doc_len = self.doc_lens[doc_idx];
            let mut score = 0.0;
            for term in &query_terms {
                let tf = match freqs.get(term) {
                    Some(&tf) => tf as f64,
                    None => continue,
                };
                let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f64;
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                let norm = K1 * (1.0 - B + B * doc_len / self.avg_doc_len.max(1.0));
                score += idf * tf * (K1 + 1.0) / (tf + norm);
            }
            if score > 0.0 {
                scored.push((doc_idx, score));
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }
}

/// Lowercase alphanumeric tokenization shared by indexing and queries.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_returns_nothing() {
        let index = Bm25Index::build(std::iter::empty());
        assert!(index.search("anything", 10).is_empty());
    }

    #[test]
    fn exact_term_match_ranks_first() {
        let index = Bm25Index::build([
            "the capital of florenia is rosewick",
            "bananas are yellow fruit",
            "rivers flow to the sea",
        ]);
        let results = index.search("capital of florenia", 10);
        assert_eq!(results[0].0, 0);
    }

    #[test]
    fn rare_terms_outweigh_common_ones() {
        let index = Bm25Index::build([
            "alpha alpha alpha common",
            "zephyr common",
            "common words only here",
        ]);
        // "zephyr" appears in one document; that document must win.
        let results = index.search("zephyr", 10);
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn no_match_yields_empty() {
        let index = Bm25Index::build(["some text", "other text"]);
        assert!(index.search("nonexistentterm", 10).is_empty());
    }

    #[test]
    fn tokenization_is_case_insensitive() {
        let index = Bm25Index::build(["Rosewick Is The Capital"]);
        assert!(!index.search("rosewick", 10).is_empty());
        assert!(!index.search("ROSEWICK", 10).is_empty());
    }

    #[test]
    fn limit_is_honored() {
        let texts: Vec<String> = (0..20).map(|i| format!("shared term doc{i}")).collect();
        let index = Bm25Index::build(texts.iter().map(|s| s.as_str()));
        assert_eq!(index.search("shared", 5).len(), 5);
    }
}
