use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Session storage and eviction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Root directory holding one artifact directory per live session.
    /// Empty means "resolve a platform default under the state dir".
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_seconds: u64,
    #[serde(default = "default_sweep_secs")]
    pub sweep_interval_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            ttl_seconds: default_ttl_secs(),
            sweep_interval_seconds: default_sweep_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_sweep_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

/// Retrieval pipeline settings (fusion weights, pool sizes, diversity).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f64,
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_fetch_pool")]
    pub fetch_pool: usize,
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_weight: default_lexical_weight(),
            vector_weight: default_vector_weight(),
            top_k: default_top_k(),
            fetch_pool: default_fetch_pool(),
            mmr_lambda: default_mmr_lambda(),
        }
    }
}

fn default_lexical_weight() -> f64 {
    DEFAULT_LEXICAL_WEIGHT
}

fn default_vector_weight() -> f64 {
    DEFAULT_VECTOR_WEIGHT
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_fetch_pool() -> usize {
    DEFAULT_FETCH_POOL
}

fn default_mmr_lambda() -> f64 {
    DEFAULT_MMR_LAMBDA
}

/// Cross-encoder rerank service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankConfig {
    /// Base URL of an HTTP rerank service. Empty disables re-ranking
    /// (the fused ranking is returned as-is).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_rerank_model")]
    pub model: String,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: default_rerank_model(),
        }
    }
}

fn default_rerank_model() -> String {
    DEFAULT_RERANK_MODEL.to_string()
}

/// External model service settings (chat, embeddings, rerank).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub rerank: RerankConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            embedding_model: default_embedding_model(),
            rerank: RerankConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
}
