use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::session::{QuizDocument, SessionSummary},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes handling session provisioning (creation, lookup, export, import).
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/import", post(import_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/export", get(export_session))
}

/// Create a fresh session around a submitted question set.
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    request_body = QuizDocument,
    responses(
        (status = 200, description = "Session created", body = SessionSummary)
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuizDocument>>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = session_service::create_session(&state, payload).await?;
    Ok(Json(summary))
}

/// Provision a session from a previously exported quiz document.
#[utoipa::path(
    post,
    path = "/api/sessions/import",
    tag = "sessions",
    request_body = QuizDocument,
    responses(
        (status = 200, description = "Session created from import", body = SessionSummary)
    )
)]
pub async fn import_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuizDocument>>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = session_service::create_session(&state, payload).await?;
    Ok(Json(summary))
}

/// Look up a session summary by its join code.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Session summary", body = SessionSummary),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = session_service::session_summary(&state, &id).await?;
    Ok(Json(summary))
}

/// Download a session's question set for later import.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/export",
    tag = "sessions",
    params(("id" = String, Path, description = "Join code of the session")),
    responses(
        (status = 200, description = "Quiz document", body = QuizDocument),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn export_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<QuizDocument>, AppError> {
    let document = session_service::export_session(&state, &id).await?;
    Ok(Json(document))
}
