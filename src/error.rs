use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failures surfaced by the service, each mapped to a distinct HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Bad or empty input, including invalid session identifiers.
    #[error("{0}")]
    Validation(String),

    /// A question was asked for a session with no uploaded documents.
    #[error("No PDFs uploaded yet for this session_id")]
    SessionNotFound,

    /// Uploaded documents produced no extractable text.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// Storage read/write/delete failure.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding, rerank, or chat-completion call failure.
    #[error("generation failed: {0}")]
    Generation(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::SessionNotFound => StatusCode::NOT_FOUND,
            ServiceError::Ingestion(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServiceError::Validation("empty".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::SessionNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::Ingestion("no text".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Generation("timeout".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn not_found_detail_matches_api_contract() {
        assert_eq!(
            ServiceError::SessionNotFound.to_string(),
            "No PDFs uploaded yet for this session_id"
        );
    }
}
