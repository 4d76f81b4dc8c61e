use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::session::{GenerateQuizRequest, QuizDocument},
    error::AppError,
    services::generation_service,
    state::SharedState,
};

/// Routes delegating quiz authoring to the generation service.
pub fn router() -> Router<SharedState> {
    Router::new().route("/quizzes/generate", post(generate_quiz))
}

/// Turn a free-text prompt into a quiz document.
#[utoipa::path(
    post,
    path = "/api/quizzes/generate",
    tag = "quizzes",
    request_body = GenerateQuizRequest,
    responses(
        (status = 200, description = "Generated quiz", body = QuizDocument),
        (status = 503, description = "Generation service unavailable or returned garbage")
    )
)]
pub async fn generate_quiz(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GenerateQuizRequest>>,
) -> Result<Json<QuizDocument>, AppError> {
    let document = generation_service::generate_quiz(&state, &payload.prompt).await?;
    Ok(Json(document))
}
