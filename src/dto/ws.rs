use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::state::session::{Question, RoundResult, Session, SessionStatus, StandingEntry};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from quiz WebSocket clients.
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Bind the sending connection as the session's host.
    #[serde(rename = "host:join")]
    HostJoin {
        /// Join code of the session to bind to.
        session_id: String,
    },
    /// Join (or reconnect to) a session as a player.
    #[serde(rename = "player:join")]
    PlayerJoin {
        /// Join code of the session.
        session_id: String,
        /// Display name, unique case-insensitively within the session.
        player_name: String,
    },
    /// Host starts the quiz from the lobby.
    #[serde(rename = "host:start")]
    HostStart {
        /// Per-question time limit in seconds, clamped server-side.
        #[serde(default)]
        time_limit: Option<u32>,
    },
    /// Player submits or changes their answer for the active question.
    #[serde(rename = "player:answer")]
    PlayerAnswer {
        /// Selected option index.
        option: usize,
    },
    /// Host ends the current question ahead of the countdown.
    #[serde(rename = "host:skip")]
    HostSkip,
    /// Anything this server version does not understand.
    #[serde(other)]
    Unknown,
}

/// Roster line shown in the lobby and in standings.
#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct PlayerSummary {
    /// Player display name.
    pub name: String,
    /// Cumulative score.
    pub score: u32,
}

impl From<StandingEntry> for PlayerSummary {
    fn from(entry: StandingEntry) -> Self {
        Self {
            name: entry.name,
            score: entry.score,
        }
    }
}

/// Question as the host sees it, correct index included.
#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct QuestionSnapshot {
    /// Question text.
    pub text: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct_index: usize,
}

impl From<&Question> for QuestionSnapshot {
    fn from(question: &Question) -> Self {
        Self {
            text: question.text.clone(),
            options: question.options.clone(),
            correct_index: question.correct_index,
        }
    }
}

/// One player's outcome for a finished question.
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct PlayerResult {
    /// Player display name.
    pub name: String,
    /// Option the player selected, absent if they never answered.
    pub answer: Option<usize>,
    /// Whether the selection was correct.
    pub correct: bool,
    /// Points earned this round.
    pub points: u32,
    /// Cumulative score after this round.
    pub total_score: u32,
    /// Seconds between the question opening and the first submission.
    pub seconds_taken: Option<u32>,
}

impl From<RoundResult> for PlayerResult {
    fn from(result: RoundResult) -> Self {
        Self {
            name: result.name,
            answer: result.answer,
            correct: result.correct,
            points: result.points,
            total_score: result.total_score,
            seconds_taken: result.seconds_taken,
        }
    }
}

/// Podium line in the final announcement.
#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct PodiumEntry {
    /// Rank, starting at 1.
    pub rank: usize,
    /// Player display name.
    pub name: String,
    /// Final score.
    pub score: u32,
}

#[derive(Debug, Serialize, Clone, ToSchema)]
/// Messages pushed to quiz WebSocket clients.
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full session snapshot, sent privately to a binding host.
    #[serde(rename = "host:session")]
    HostSession {
        /// Quiz display name.
        name: String,
        /// Lifecycle status.
        status: SessionStatus,
        /// The complete question set, correct indexes included.
        questions: Vec<QuestionSnapshot>,
        /// Current roster in join order.
        players: Vec<PlayerSummary>,
    },
    /// Roster update broadcast to the room.
    #[serde(rename = "lobby:players")]
    LobbyPlayers {
        /// Quiz display name.
        quiz_name: String,
        /// Current roster in join order.
        players: Vec<PlayerSummary>,
    },
    /// A question opened for answering; the correct index is withheld.
    #[serde(rename = "quiz:question")]
    QuizQuestion {
        /// Question text.
        question: String,
        /// Answer options in display order.
        options: Vec<String>,
        /// 1-based question number.
        number: usize,
        /// Total number of questions.
        total: usize,
        /// Seconds allowed for answering.
        time_limit: u32,
        /// Players present when the question opened.
        player_count: usize,
    },
    /// Correct index for the active question, sent privately to the host.
    #[serde(rename = "host:correct_answer")]
    HostCorrectAnswer {
        /// Index of the correct option.
        correct_index: usize,
    },
    /// Question countdown tick broadcast to the room.
    #[serde(rename = "quiz:timer")]
    QuizTimer {
        /// Seconds remaining for the active question.
        seconds_left: u32,
    },
    /// Answered-so-far progress broadcast to the room.
    #[serde(rename = "host:answer_count")]
    HostAnswerCount {
        /// Players that have answered the active question.
        answered: usize,
        /// Players currently present.
        total: usize,
    },
    /// Per-option selection tally, sent privately to the host.
    #[serde(rename = "host:answer_stats")]
    HostAnswerStats {
        /// Selection counts per option index.
        tally: Vec<u32>,
    },
    /// Results for a finished question, broadcast to the room.
    #[serde(rename = "quiz:results")]
    QuizResults {
        /// Index of the correct option.
        correct_index: usize,
        /// Text of the correct option.
        correct_text: String,
        /// Per-player results, descending by cumulative score.
        results: Vec<PlayerResult>,
    },
    /// Inter-question countdown tick broadcast to the room.
    #[serde(rename = "quiz:countdown")]
    QuizCountdown {
        /// Seconds until the next question (or the final standings).
        seconds_left: u32,
        /// Whether the countdown leads to the final standings.
        is_last: bool,
    },
    /// Final podium and standings broadcast to the room.
    #[serde(rename = "quiz:finished")]
    QuizFinished {
        /// Up to the top three players with explicit ranks.
        podium: Vec<PodiumEntry>,
        /// All players, descending by score, ties in join order.
        standings: Vec<PlayerSummary>,
    },
    /// The session is gone; broadcast to the room.
    #[serde(rename = "session:ended")]
    SessionEnded {
        /// Human-readable reason.
        reason: String,
    },
    /// Failure notice sent privately to the connection that caused it.
    #[serde(rename = "error")]
    Error {
        /// Human-readable message.
        message: String,
    },
}

impl ServerMessage {
    /// Build the private host snapshot for `session`.
    pub fn session_snapshot(session: &Session) -> Self {
        Self::HostSession {
            name: session.name.clone(),
            status: session.status,
            questions: session.questions.iter().map(QuestionSnapshot::from).collect(),
            players: session
                .roster()
                .into_iter()
                .map(PlayerSummary::from)
                .collect(),
        }
    }

    /// Build the roster broadcast for `session`.
    pub fn roster(session: &Session) -> Self {
        Self::LobbyPlayers {
            quiz_name: session.name.clone(),
            players: session
                .roster()
                .into_iter()
                .map(PlayerSummary::from)
                .collect(),
        }
    }
}
