//! Session provisioning: create, lookup, export, import.
//!
//! These are thin wrappers that turn validated quiz documents into lobby
//! sessions inside the registry; the lifecycle engine takes over from there.

use tracing::info;

use crate::{
    dto::session::{QuestionInput, QuizDocument, SessionSummary},
    error::ServiceError,
    state::{
        SharedState,
        session::{OPTION_COUNT, Question},
    },
};

/// Provision a new lobby session from a quiz document.
pub async fn create_session(
    state: &SharedState,
    document: QuizDocument,
) -> Result<SessionSummary, ServiceError> {
    let questions = build_questions(document.questions)?;
    let name = document.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::Validation(
            "quiz name must not be empty".into(),
        ));
    }

    let (code, handle) = state.sessions().create(name, questions);
    let session = handle.lock().await;
    info!(
        session = %code,
        questions = session.questions.len(),
        "session created"
    );
    Ok(SessionSummary::from(&*session))
}

/// Look up a session summary by join code.
pub async fn session_summary(
    state: &SharedState,
    code: &str,
) -> Result<SessionSummary, ServiceError> {
    let handle = state
        .sessions()
        .get(code)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{code}` not found")))?;
    let session = handle.lock().await;
    Ok(SessionSummary::from(&*session))
}

/// Export a session's question set as a reusable quiz document.
pub async fn export_session(
    state: &SharedState,
    code: &str,
) -> Result<QuizDocument, ServiceError> {
    let handle = state
        .sessions()
        .get(code)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{code}` not found")))?;
    let session = handle.lock().await;
    Ok(QuizDocument::from(&*session))
}

/// Convert and structurally check an inbound question set.
///
/// The DTO layer already validates shapes; this converts into the runtime
/// model and enforces the same rules for callers that bypass the extractor
/// (generation output, imports assembled in code).
pub fn build_questions(inputs: Vec<QuestionInput>) -> Result<Vec<Question>, ServiceError> {
    if inputs.is_empty() {
        return Err(ServiceError::Validation(
            "a quiz requires at least one question".into(),
        ));
    }

    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            if input.text.trim().is_empty() {
                return Err(ServiceError::Validation(format!(
                    "question {} has no text",
                    index + 1
                )));
            }
            if input.options.len() != OPTION_COUNT {
                return Err(ServiceError::Validation(format!(
                    "question {} must have exactly {OPTION_COUNT} options",
                    index + 1
                )));
            }
            if input.options.iter().any(|option| option.trim().is_empty()) {
                return Err(ServiceError::Validation(format!(
                    "question {} has a blank option",
                    index + 1
                )));
            }
            if input.correct_index >= OPTION_COUNT {
                return Err(ServiceError::Validation(format!(
                    "question {} has an out-of-range correct index",
                    index + 1
                )));
            }
            Ok(input.into())
        })
        .collect()
}
