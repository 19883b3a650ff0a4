use super::Config;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ConfigValidationError {
            path: "server.port".to_string(),
            message: "Port must be greater than 0".to_string(),
        });
    }

    if config.storage.ttl_seconds == 0 {
        errors.push(ConfigValidationError {
            path: "storage.ttlSeconds".to_string(),
            message: "Session TTL must be greater than 0".to_string(),
        });
    }

    if config.storage.sweep_interval_seconds == 0 {
        errors.push(ConfigValidationError {
            path: "storage.sweepIntervalSeconds".to_string(),
            message: "Sweep interval must be greater than 0".to_string(),
        });
    }

    if config.chunking.chunk_size == 0 {
        errors.push(ConfigValidationError {
            path: "chunking.chunkSize".to_string(),
            message: "Chunk size must be greater than 0".to_string(),
        });
    }

    if config.chunking.overlap >= config.chunking.chunk_size {
        errors.push(ConfigValidationError {
            path: "chunking.overlap".to_string(),
            message: "Overlap must be smaller than the chunk size".to_string(),
        });
    }

    let weight_sum = config.retrieval.lexical_weight + config.retrieval.vector_weight;
    if weight_sum <= 0.0 {
        errors.push(ConfigValidationError {
            path: "retrieval.lexicalWeight".to_string(),
            message: "Fusion weights must sum to a positive value".to_string(),
        });
    }

    if !(0.0..=1.0).contains(&config.retrieval.mmr_lambda) {
        errors.push(ConfigValidationError {
            path: "retrieval.mmrLambda".to_string(),
            message: "MMR lambda must be within [0.0, 1.0]".to_string(),
        });
    }

    if config.retrieval.top_k > config.retrieval.fetch_pool {
        errors.push(ConfigValidationError {
            path: "retrieval.topK".to_string(),
            message: "topK cannot exceed fetchPool".to_string(),
        });
    }

    if config.models.base_url.is_empty() {
        errors.push(ConfigValidationError {
            path: "models.baseUrl".to_string(),
            message: "Model base URL is required".to_string(),
        });
    }

    if let Some(level) = &config.logging.level {
        let known = ["trace", "debug", "info", "warn", "error"];
        if !known.contains(&level.as_str()) {
            errors.push(ConfigValidationError {
                path: "logging.level".to_string(),
                message: "Level must be one of trace, debug, info, warn, error".to_string(),
            });
        }
    }

    if config.models.api_key.is_none() {
        warn!("No model API key configured; uploads and asks will fail against real providers");
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn zero_ttl_rejected() {
        let mut config = Config::default();
        config.storage.ttl_seconds = 0;
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.path == "storage.ttlSeconds"));
    }

    #[test]
    fn overlap_must_be_below_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 100;
        config.chunking.overlap = 100;
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.path == "chunking.overlap"));
    }

    #[test]
    fn unknown_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = Some("verbose".to_string());
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.path == "logging.level"));

        config.logging.level = Some("debug".to_string());
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn top_k_bounded_by_fetch_pool() {
        let mut config = Config::default();
        config.retrieval.top_k = 20;
        config.retrieval.fetch_pool = 10;
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.path == "retrieval.topK"));
    }
}
