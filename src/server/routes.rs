use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::answer::Answer;
use crate::error::ServiceError;
use crate::server::AppState;
use crate::sessions::UploadedFile;

/// Uploads above this size are rejected before they reach the extractor.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build all routes for the service.
pub fn build_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/upload_pdfs", post(upload_handler))
        .route("/ask", post(ask_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime: u64,
    sessions_active: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime: state.start_time.elapsed().as_secs(),
        sessions_active: state.store.active_count(),
    })
}

// ============================================================================
// Upload
// ============================================================================

#[derive(Debug, Deserialize)]
struct UploadQuery {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    status: String,
    message: String,
    files: usize,
    chunks: usize,
}

async fn upload_handler(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServiceError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Validation(format!("malformed multipart payload: {e}")))?
    {
        let name = field
            .file_name()
            .map(str::to_string)
            .or_else(|| field.name().map(str::to_string))
            .unwrap_or_default();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::Validation(format!("unreadable multipart field: {e}")))?;
        debug!(session_id = %query.session_id, file = %name, size = bytes.len(), "received upload part");
        files.push(UploadedFile { name, bytes });
    }

    let receipt = state.store.upload(&query.session_id, files).await?;
    Ok(Json(UploadResponse {
        status: "ok".to_string(),
        message: "PDFs uploaded and retriever ready".to_string(),
        files: receipt.files,
        chunks: receipt.chunks,
    }))
}

// ============================================================================
// Ask
// ============================================================================

#[derive(Debug, Deserialize)]
struct AskRequest {
    session_id: String,
    question: String,
}

async fn ask_handler(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, ServiceError> {
    let answer = state.store.ask(&req.session_id, &req.question).await?;
    Ok(Json(answer))
}
