pub mod fusion;
pub mod lexical;
pub mod vector;

use tracing::debug;

use crate::config::RetrievalConfig;
use crate::error::ServiceError;
use crate::ingest::DocumentChunk;
use crate::providers::{EmbeddingProviderHandle, RerankerHandle};

use lexical::Bm25Index;
use vector::VectorIndex;

/// A retrieved chunk with its final relevance score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f64,
}

/// The retrieval capability owned by a session: a BM25 index and a vector
/// index over the same chunk sequence, fused and re-ranked per query.
///
/// Immutable once built; a re-upload builds a replacement wholesale.
pub struct Retriever {
    chunks: Vec<DocumentChunk>,
    lexical: Bm25Index,
    vectors: VectorIndex,
    embedder: EmbeddingProviderHandle,
    reranker: Option<RerankerHandle>,
    config: RetrievalConfig,
}

/// Build the retrieval capability for a chunk sequence.
///
/// Embeds every chunk up front (one batched call) and constructs both
/// index sides. Pure with respect to session state: the caller installs
/// the result.
pub async fn build_index(
    chunks: Vec<DocumentChunk>,
    embedder: EmbeddingProviderHandle,
    reranker: Option<RerankerHandle>,
    config: RetrievalConfig,
) -> Result<Retriever, ServiceError> {
    if chunks.is_empty() {
        return Err(ServiceError::Ingestion(
            "no extractable text in uploaded documents".to_string(),
        ));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder
        .embed(&texts)
        .await
        .map_err(|e| ServiceError::Generation(format!("embedding failed: {e}")))?;

    // A ragged or zero-width batch is a malformed provider response, not
    // a panic inside the dot products downstream.
    let dim = embeddings.first().map(Vec::len).unwrap_or(0);
    if dim == 0 || embeddings.iter().any(|v| v.len() != dim) {
        return Err(ServiceError::Generation(
            "embedding response has inconsistent dimensions".to_string(),
        ));
    }

    let lexical = Bm25Index::build(texts.iter().map(|t| t.as_str()));
    let vectors = VectorIndex::build(embeddings);

    debug!(
        chunks = chunks.len(),
        model = embedder.model_name(),
        "retrieval index built"
    );

    Ok(Retriever {
        chunks,
        lexical,
        vectors,
        embedder,
        reranker,
        config,
    })
}

impl Retriever {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Retrieve the passages most relevant to `query`.
    ///
    /// Pipeline: BM25 top-pool, vector MMR top-pool, weighted RRF fusion,
    /// then a cross-encoder pass over the fused pool that re-scores on the
    /// full query+passage pair. Without a configured reranker the fused
    /// ranking is returned directly. Result length is at most `top_k`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>, ServiceError> {
        let pool = self.config.fetch_pool;

        let lexical_hits = self.lexical.search(query, pool);

        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| ServiceError::Generation(format!("query embedding failed: {e}")))?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Generation("empty query embedding".to_string()))?;
        if query_vec.len() != self.vectors.dim() {
            return Err(ServiceError::Generation(format!(
                "query embedding width {} does not match index width {}",
                query_vec.len(),
                self.vectors.dim()
            )));
        }
        let vector_hits = self
            .vectors
            .search_mmr(&query_vec, pool, self.config.mmr_lambda);

        let fused = fusion::merge_results(
            &lexical_hits,
            &vector_hits,
            self.config.lexical_weight,
            self.config.vector_weight,
            pool,
        );

        let ranked = match &self.reranker {
            Some(reranker) => self.cross_encode(query, fused, reranker).await?,
            None => fused,
        };

        Ok(ranked
            .into_iter()
            .take(self.config.top_k)
            .map(|(idx, score)| ScoredChunk {
                chunk: self.chunks[idx].clone(),
                score,
            })
            .collect())
    }

    /// Re-score the fused candidates with the cross-encoder and sort by
    /// its scores.
    async fn cross_encode(
        &self,
        query: &str,
        fused: Vec<(usize, f64)>,
        reranker: &RerankerHandle,
    ) -> Result<Vec<(usize, f64)>, ServiceError> {
        let passages: Vec<String> = fused
            .iter()
            .map(|&(idx, _)| self.chunks[idx].text.clone())
            .collect();
        let scores = reranker
            .rerank(query, &passages)
            .await
            .map_err(|e| ServiceError::Generation(format!("rerank failed: {e}")))?;
        if scores.len() != passages.len() {
            return Err(ServiceError::Generation(format!(
                "rerank returned {} scores for {} passages",
                scores.len(),
                passages.len()
            )));
        }

        let mut rescored: Vec<(usize, f64)> = fused
            .into_iter()
            .zip(scores)
            .map(|((idx, _fused_score), score)| (idx, score))
            .collect();
        rescored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(rescored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Arc;

    use crate::providers::{EmbeddingProvider, Reranker};

    /// Deterministic embedding: one dimension per vocabulary word,
    /// counting occurrences. Shared-word texts get similar vectors.
    struct BagEmbedder {
        vocab: Vec<String>,
    }

    impl BagEmbedder {
        fn new(vocab: &[&str]) -> Self {
            Self {
                vocab: vocab.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for BagEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
            Ok(texts
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    self.vocab
                        .iter()
                        .map(|w| lower.matches(w.as_str()).count() as f64)
                        .collect()
                })
                .collect())
        }

        fn model_name(&self) -> String {
            "bag-of-words-stub".to_string()
        }
    }

    /// Malformed provider: vectors in one batch disagree on width.
    struct RaggedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for RaggedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| vec![1.0; i + 1])
                .collect())
        }

        fn model_name(&self) -> String {
            "ragged-stub".to_string()
        }
    }

    /// Malformed provider: query embeddings come back narrower than the
    /// chunk embeddings did.
    struct SkewedWidthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for SkewedWidthEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
            let width = if texts.len() == 1 { 2 } else { 3 };
            Ok(texts.iter().map(|_| vec![1.0; width]).collect())
        }

        fn model_name(&self) -> String {
            "skewed-stub".to_string()
        }
    }

    /// Scores passages by query-word overlap.
    struct OverlapReranker;

    #[async_trait]
    impl Reranker for OverlapReranker {
        async fn rerank(&self, query: &str, passages: &[String]) -> Result<Vec<f64>> {
            let query = query.to_lowercase();
            let words: Vec<&str> = query.split_whitespace().collect();
            Ok(passages
                .iter()
                .map(|p| {
                    let p = p.to_lowercase();
                    words.iter().filter(|w| p.contains(**w)).count() as f64
                })
                .collect())
        }
    }

    fn chunk(text: &str, page: u32, index: usize) -> DocumentChunk {
        DocumentChunk {
            text: text.to_string(),
            page,
            source: "doc.pdf".to_string(),
            index,
        }
    }

    fn embedder() -> EmbeddingProviderHandle {
        Arc::new(BagEmbedder::new(&[
            "capital", "florenia", "rosewick", "banana", "river", "sea",
        ]))
    }

    #[tokio::test]
    async fn empty_chunks_fail_to_build() {
        let result = build_index(Vec::new(), embedder(), None, RetrievalConfig::default()).await;
        assert!(matches!(result, Err(ServiceError::Ingestion(_))));
    }

    #[tokio::test]
    async fn ragged_embedding_batch_is_a_generation_error() {
        let chunks = vec![chunk("one", 1, 0), chunk("two", 1, 1)];
        let result = build_index(
            chunks,
            Arc::new(RaggedEmbedder),
            None,
            RetrievalConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Generation(_))));
    }

    #[tokio::test]
    async fn query_width_mismatch_is_a_generation_error() {
        let chunks = vec![chunk("one", 1, 0), chunk("two", 1, 1)];
        let retriever = build_index(
            chunks,
            Arc::new(SkewedWidthEmbedder),
            None,
            RetrievalConfig::default(),
        )
        .await
        .unwrap();
        let result = retriever.retrieve("anything").await;
        assert!(matches!(result, Err(ServiceError::Generation(_))));
    }

    #[tokio::test]
    async fn relevant_chunk_ranks_first() {
        let chunks = vec![
            chunk("The capital of Florenia is Rosewick.", 1, 0),
            chunk("Bananas are a yellow fruit.", 1, 1),
            chunk("Rivers flow to the sea.", 2, 2),
        ];
        let retriever = build_index(chunks, embedder(), None, RetrievalConfig::default())
            .await
            .unwrap();
        let results = retriever
            .retrieve("What is the capital of Florenia?")
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert!(results[0].chunk.text.contains("Rosewick"));
        assert!(results.len() <= 3);
    }

    #[tokio::test]
    async fn reranker_reorders_fused_pool() {
        let chunks = vec![
            chunk("capital capital capital florenia", 1, 0),
            chunk("rosewick is the capital of florenia", 1, 1),
        ];
        let retriever = build_index(
            chunks,
            embedder(),
            Some(Arc::new(OverlapReranker) as RerankerHandle),
            RetrievalConfig::default(),
        )
        .await
        .unwrap();
        let results = retriever
            .retrieve("rosewick capital florenia")
            .await
            .unwrap();
        // Overlap with all three query words beats repeated "capital".
        assert!(results[0].chunk.text.contains("rosewick"));
    }

    #[tokio::test]
    async fn top_k_bounds_results() {
        let chunks: Vec<DocumentChunk> = (0..12)
            .map(|i| chunk(&format!("river sea passage number {i}"), 1, i))
            .collect();
        let retriever = build_index(chunks, embedder(), None, RetrievalConfig::default())
            .await
            .unwrap();
        let results = retriever.retrieve("river sea").await.unwrap();
        assert!(results.len() <= 3);
    }
}
