use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::conversion_error::ConversionError;
use crate::services::ConversionService;
use crate::uploads::{validate_file_name, PendingUpload, UploadProgress, UploadSessions};

#[derive(Clone)]
pub struct AppState {
    pub conversion_service: ConversionService,
    pub sessions: UploadSessions,
    pub output_file_name: String,
    pub max_upload_bytes: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UploadAcceptedResponse {
    pub status: String,
    pub files_received: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    let api_routes = Router::new()
        .route("/health", get(health))
        .route(
            "/sessions/{session_id}/uploads/{file_name}",
            put(upload_workbook),
        )
        .route("/sessions/{session_id}", delete(reset_session))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// Accept one workbook for a session; converts once the second one arrives
#[instrument(skip(state, body), fields(session_id = %session_id, file_name = %file_name, bytes = body.len()))]
async fn upload_workbook(
    State(state): State<AppState>,
    Path((session_id, file_name)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    validate_file_name(&file_name).map_err(|e| {
        warn!("Rejected upload for session {}: {}", session_id, e);
        api_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
    })?;

    let upload = PendingUpload {
        file_name,
        bytes: body.to_vec(),
    };

    let (first, second) = match state.sessions.push(&session_id, upload).await {
        UploadProgress::AwaitingSecondFile { files_received } => {
            info!("Session {} received workbook {} of 2", session_id, files_received);
            let response = UploadAcceptedResponse {
                status: "awaiting_second_file".to_string(),
                files_received,
                message: "First spreadsheet received. Please upload the second spreadsheet."
                    .to_string(),
            };
            return Ok((StatusCode::ACCEPTED, Json(response)).into_response());
        }
        UploadProgress::Ready(first, second) => (first, second),
    };

    info!(
        "Converting '{}' and '{}' for session {}",
        first.file_name, second.file_name, session_id
    );

    // calamine parsing is CPU-bound, keep it off the async workers
    let service = state.conversion_service.clone();
    let result = tokio::task::spawn_blocking(move || service.convert(&first.bytes, &second.bytes))
        .await
        .unwrap_or_else(|e| Err(ConversionError::Failed(e.to_string())));

    match result {
        Ok(json) => {
            info!("Session {} conversion produced {} bytes", session_id, json.len());
            let disposition = format!("attachment; filename=\"{}\"", state.output_file_name);
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                json,
            )
                .into_response())
        }
        Err(e) => {
            error!("Conversion failed for session {}: {}", session_id, e);
            Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}

/// Forget any pending uploads so the next upload starts a fresh pair
#[instrument(skip(state), fields(session_id = %session_id))]
async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    let cleared = state.sessions.reset(&session_id).await;
    debug!("Reset session {} (had pending uploads: {})", session_id, cleared);
    StatusCode::NO_CONTENT
}
