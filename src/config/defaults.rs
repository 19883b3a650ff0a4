/// Default configuration constants used across the system.

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 18990;

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Idle-session TTL before eviction (1 hour).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Interval between background sweep passes (5 minutes).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Chunk window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1200;

/// Overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Fusion weight applied to the lexical (BM25) ranking.
pub const DEFAULT_LEXICAL_WEIGHT: f64 = 0.4;

/// Fusion weight applied to the vector ranking.
pub const DEFAULT_VECTOR_WEIGHT: f64 = 0.6;

/// Results returned to the answering service after re-ranking.
pub const DEFAULT_TOP_K: usize = 3;

/// Candidate pool fetched from each retriever before fusion.
pub const DEFAULT_FETCH_POOL: usize = 10;

/// MMR relevance/diversity trade-off (1.0 = pure relevance).
pub const DEFAULT_MMR_LAMBDA: f64 = 0.7;

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default chat sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default cross-encoder rerank model.
pub const DEFAULT_RERANK_MODEL: &str = "BAAI/bge-reranker-base";

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
