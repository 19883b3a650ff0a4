mod openai;
mod rerank;

pub use openai::{OpenAiChatProvider, OpenAiEmbeddingProvider};
pub use rerank::HttpReranker;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;

// ============================================================================
// Provider Traits
// ============================================================================

/// A provider that turns text into dense vector embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute embeddings for a batch of texts, one vector per input.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;

    /// The model identifier used by this provider.
    fn model_name(&self) -> String;
}

/// A provider that produces one chat completion for a prompt.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> String;
}

/// A cross-encoder that scores question/passage pairs.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score each passage against `query`; higher is more relevant.
    /// Returns exactly one score per input passage.
    async fn rerank(&self, query: &str, passages: &[String]) -> Result<Vec<f64>>;
}

/// Type-erased shared handles.
pub type EmbeddingProviderHandle = Arc<dyn EmbeddingProvider>;
pub type ChatProviderHandle = Arc<dyn ChatProvider>;
pub type RerankerHandle = Arc<dyn Reranker>;

/// The external model services the orchestration layer calls into.
#[derive(Clone)]
pub struct ModelServices {
    pub embedder: EmbeddingProviderHandle,
    pub chat: ChatProviderHandle,
    /// `None` when no rerank service is configured; the fused ranking is
    /// then used directly.
    pub reranker: Option<RerankerHandle>,
}

// ============================================================================
// Factory
// ============================================================================

/// Build the model service handles from configuration.
pub fn create_services(config: &Config) -> Result<ModelServices> {
    let api_key = config
        .models
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no model API key configured (set OPENAI_API_KEY)"))?;

    let embedder: EmbeddingProviderHandle = Arc::new(OpenAiEmbeddingProvider::new(
        api_key.clone(),
        config.models.base_url.clone(),
        config.models.embedding_model.clone(),
    ));

    let chat: ChatProviderHandle = Arc::new(OpenAiChatProvider::new(
        api_key.clone(),
        config.models.base_url.clone(),
        config.models.chat_model.clone(),
        config.models.temperature,
    ));

    let reranker: Option<RerankerHandle> = config.models.rerank.base_url.as_ref().map(|url| {
        Arc::new(HttpReranker::new(
            api_key.clone(),
            url.clone(),
            config.models.rerank.model.clone(),
        )) as RerankerHandle
    });

    Ok(ModelServices {
        embedder,
        chat,
        reranker,
    })
}
