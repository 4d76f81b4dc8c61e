use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::state::session::{OPTION_COUNT, Question, Session, SessionStatus};

const MAX_QUESTION_TEXT_LENGTH: usize = 300;
const MAX_OPTION_LENGTH: usize = 120;

/// One question supplied when creating, importing, or exporting a quiz.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct QuestionInput {
    /// Question text shown to the room.
    pub text: String,
    /// Exactly four answer options, in display order.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct_index: usize,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() || self.text.len() > MAX_QUESTION_TEXT_LENGTH {
            let mut err = ValidationError::new("question_text");
            err.message = Some(
                format!("question text must be 1..={MAX_QUESTION_TEXT_LENGTH} characters").into(),
            );
            errors.add("text", err);
        }

        if self.options.len() != OPTION_COUNT {
            let mut err = ValidationError::new("option_count");
            err.message = Some(format!("a question must have exactly {OPTION_COUNT} options").into());
            errors.add("options", err);
        } else if self
            .options
            .iter()
            .any(|option| option.trim().is_empty() || option.len() > MAX_OPTION_LENGTH)
        {
            let mut err = ValidationError::new("option_text");
            err.message =
                Some(format!("options must be 1..={MAX_OPTION_LENGTH} characters").into());
            errors.add("options", err);
        }

        if self.correct_index >= OPTION_COUNT {
            let mut err = ValidationError::new("correct_index");
            err.message = Some(format!("correct index must be below {OPTION_COUNT}").into());
            errors.add("correct_index", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl From<QuestionInput> for Question {
    fn from(input: QuestionInput) -> Self {
        Self {
            text: input.text,
            options: input.options,
            correct_index: input.correct_index,
        }
    }
}

impl From<&Question> for QuestionInput {
    fn from(question: &Question) -> Self {
        Self {
            text: question.text.clone(),
            options: question.options.clone(),
            correct_index: question.correct_index,
        }
    }
}

/// A complete quiz document: the payload of session creation, import, export,
/// and the output of the generation service.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct QuizDocument {
    /// Display name of the quiz.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// The ordered question set.
    #[validate(length(min = 1, max = 50), nested)]
    pub questions: Vec<QuestionInput>,
}

/// Free-text prompt turned into a quiz by the generation service.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GenerateQuizRequest {
    /// Topic or instructions for the generated quiz.
    #[validate(length(min = 1, max = 500))]
    pub prompt: String,
}

/// Summary returned once a session has been created or looked up.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Join code identifying the session.
    pub id: String,
    /// Display name of the quiz.
    pub name: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Number of questions in the set.
    pub question_count: usize,
    /// Number of players currently present.
    pub player_count: usize,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.code.clone(),
            name: session.name.clone(),
            status: session.status,
            question_count: session.questions.len(),
            player_count: session.players.len(),
            created_at: super::format_system_time(session.created_at),
        }
    }
}

impl From<&Session> for QuizDocument {
    fn from(session: &Session) -> Self {
        Self {
            name: session.name.clone(),
            questions: session.questions.iter().map(QuestionInput::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_question() -> QuestionInput {
        QuestionInput {
            text: "What is 2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "22".into()],
            correct_index: 1,
        }
    }

    #[test]
    fn valid_document_passes() {
        let document = QuizDocument {
            name: "Maths".into(),
            questions: vec![valid_question()],
        };
        assert!(document.validate().is_ok());
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let document = QuizDocument {
            name: "Maths".into(),
            questions: vec![],
        };
        assert!(document.validate().is_err());
    }

    #[test]
    fn wrong_option_count_is_rejected() {
        let mut question = valid_question();
        question.options.pop();
        assert!(question.validate().is_err());
    }

    #[test]
    fn out_of_range_correct_index_is_rejected() {
        let mut question = valid_question();
        question.correct_index = 4;
        assert!(question.validate().is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut question = valid_question();
        question.text = "   ".into();
        assert!(question.validate().is_err());

        let mut question = valid_question();
        question.options[2] = String::new();
        assert!(question.validate().is_err());
    }
}
