//! Client for the external question-generation service.
//!
//! The collaborator is a JSON-over-HTTP sidecar: it receives a prompt and a
//! model identifier and answers with a full quiz document. Everything that can
//! go wrong on that path (transport, status, shape, content) surfaces as
//! [`ServiceError::ExternalService`]; the core never retries.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use crate::{dto::session::QuizDocument, error::ServiceError, state::SharedState};

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

/// Ask the generation service to turn a prompt into a quiz document.
pub async fn generate_quiz(
    state: &SharedState,
    prompt: &str,
) -> Result<QuizDocument, ServiceError> {
    let generator = state.config().generator();
    let url = format!("{}/v1/quizzes", generator.base_url.trim_end_matches('/'));

    let response = state
        .http()
        .post(&url)
        .timeout(Duration::from_secs(generator.timeout_secs))
        .json(&GenerationRequest {
            prompt,
            model: &generator.model,
        })
        .send()
        .await
        .map_err(|err| {
            warn!(error = %err, "generation request failed");
            ServiceError::ExternalService("generation service unreachable".into())
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(%status, "generation service returned an error status");
        return Err(ServiceError::ExternalService(format!(
            "generation service answered {status}"
        )));
    }

    let document: QuizDocument = response.json().await.map_err(|err| {
        warn!(error = %err, "generation service returned an unreadable body");
        ServiceError::ExternalService("generation service returned malformed output".into())
    })?;

    // Generated content gets the same structural checks as user input; a
    // model hallucinating three options must not reach a session.
    if let Err(err) = document.validate() {
        warn!(error = %err, "generation service returned an invalid quiz");
        return Err(ServiceError::ExternalService(
            "generation service returned an invalid quiz".into(),
        ));
    }

    info!(
        quiz = %document.name,
        questions = document.questions.len(),
        "quiz generated"
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, routing::post};

    use crate::{config::AppConfig, state::AppState};

    async fn spawn_stub(response: serde_json::Value) -> String {
        let app = Router::new().route(
            "/v1/quizzes",
            post(move || async move { Json(response) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn unreachable_generator_is_an_external_failure() {
        let state = AppState::new(AppConfig::with_generator_url(
            // Discard port; nothing listens there.
            "http://127.0.0.1:9".into(),
        ));
        let err = generate_quiz(&state, "roman history").await.unwrap_err();
        assert!(matches!(err, ServiceError::ExternalService(_)));
    }

    #[tokio::test]
    async fn malformed_output_is_an_external_failure() {
        let url = spawn_stub(serde_json::json!({ "completion": "not a quiz" })).await;
        let state = AppState::new(AppConfig::with_generator_url(url));
        let err = generate_quiz(&state, "roman history").await.unwrap_err();
        assert!(matches!(err, ServiceError::ExternalService(_)));
    }

    #[tokio::test]
    async fn structurally_invalid_quiz_is_an_external_failure() {
        let url = spawn_stub(serde_json::json!({
            "name": "Rome",
            "questions": [{
                "text": "First emperor?",
                "options": ["Augustus", "Nero"],
                "correct_index": 0
            }]
        }))
        .await;
        let state = AppState::new(AppConfig::with_generator_url(url));
        let err = generate_quiz(&state, "roman history").await.unwrap_err();
        assert!(matches!(err, ServiceError::ExternalService(_)));
    }

    #[tokio::test]
    async fn valid_output_round_trips() {
        let url = spawn_stub(serde_json::json!({
            "name": "Rome",
            "questions": [{
                "text": "First emperor?",
                "options": ["Augustus", "Nero", "Caligula", "Trajan"],
                "correct_index": 0
            }]
        }))
        .await;
        let state = AppState::new(AppConfig::with_generator_url(url));
        let document = generate_quiz(&state, "roman history").await.unwrap();
        assert_eq!(document.name, "Rome");
        assert_eq!(document.questions.len(), 1);
    }
}
