//! Runtime model of one live quiz session and its lifecycle rules.

use std::cmp::Reverse;
use std::time::SystemTime;

use indexmap::IndexMap;
use thiserror::Error;

use crate::state::{ConnectionId, scoring::compute_points, timer::Countdown};

/// Shortest allowed per-question time limit, in seconds.
pub const MIN_TIME_LIMIT_SECS: u32 = 5;
/// Longest allowed per-question time limit, in seconds.
pub const MAX_TIME_LIMIT_SECS: u32 = 120;
/// Time limit applied when the host starts without specifying one.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// One immutable quiz question.
#[derive(Debug, Clone)]
pub struct Question {
    /// The question text shown to the room.
    pub text: String,
    /// Exactly [`OPTION_COUNT`] answer options, in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_index: usize,
}

/// Per-player state tracked during a session.
#[derive(Debug, Clone)]
pub struct Player {
    /// Display name, unique case-insensitively within the session.
    pub name: String,
    /// Cumulative score. Never decremented.
    pub score: u32,
    /// Option currently selected for the active question.
    pub current_answer: Option<usize>,
    /// Countdown value captured at the first submission for the active
    /// question. Frozen for the rest of the question even if the player
    /// changes their selected option.
    pub answer_time_remaining: Option<u32>,
}

impl Player {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            score: 0,
            current_answer: None,
            answer_time_remaining: None,
        }
    }
}

/// Lifecycle status of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Players are joining; the quiz has not started.
    Lobby,
    /// Questions are being played.
    Playing,
    /// Final standings have been announced; the session awaits cleanup.
    Finished,
}

/// Error returned when a lifecycle transition would move backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {from:?} cannot advance to {to:?}")]
pub struct InvalidTransition {
    /// Status the session was in.
    pub from: SessionStatus,
    /// Status that was requested.
    pub to: SessionStatus,
}

/// How a successful `join` resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A brand-new player entered the lobby.
    Joined,
    /// An existing player record was rebound to a new connection.
    Reconnected,
}

/// Why a `join` was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRejection {
    /// The name is blank after trimming.
    #[error("player name must not be empty")]
    EmptyName,
    /// The name collides with a player whose connection is still live.
    #[error("name `{0}` is already taken")]
    DuplicateName(String),
    /// A brand-new player tried to join after the quiz left the lobby.
    #[error("the quiz has already started")]
    AlreadyStarted,
}

/// Roster line: one player's name and cumulative score, in join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingEntry {
    /// Player display name.
    pub name: String,
    /// Cumulative score.
    pub score: u32,
}

/// Per-player record produced when a question ends.
#[derive(Debug, Clone)]
pub struct RoundResult {
    /// Player display name.
    pub name: String,
    /// Option the player had selected, if any.
    pub answer: Option<usize>,
    /// Whether the selected option was the correct one.
    pub correct: bool,
    /// Points earned this round.
    pub points: u32,
    /// Cumulative score after this round.
    pub total_score: u32,
    /// Seconds the player took to first answer, if they answered.
    pub seconds_taken: Option<u32>,
}

/// Everything the room needs to hear when a question closes.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    /// Index of the correct option.
    pub correct_index: usize,
    /// Text of the correct option.
    pub correct_text: String,
    /// Per-player results, descending by cumulative score, ties in join order.
    pub results: Vec<RoundResult>,
    /// Whether another question follows this one.
    pub has_more: bool,
}

/// Aggregated state for one live quiz session.
///
/// Owned behind a `tokio::sync::Mutex`; every inbound event and timer
/// callback for the session runs under that lock, so methods here never need
/// internal synchronization.
#[derive(Debug)]
pub struct Session {
    /// Short join code identifying the session.
    pub code: String,
    /// Display name of the quiz.
    pub name: String,
    /// Ordered question set, immutable after creation.
    pub questions: Vec<Question>,
    /// Connection currently bound as host. Last binder wins.
    pub host: Option<ConnectionId>,
    /// Players keyed by connection id. Insertion order is the tie-break
    /// order for equal scores and is preserved across reconnects.
    pub players: IndexMap<ConnectionId, Player>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Index of the question currently (or next to be) played.
    pub current_index: usize,
    /// Per-question time limit in seconds, clamped at start.
    pub time_limit_secs: u32,
    /// Countdown value most recently broadcast to the room.
    pub seconds_left: u32,
    /// Whether a question countdown is running and answers are accepted.
    /// Closed by [`Session::score_round`], reopened when the next question
    /// is announced.
    pub answers_open: bool,
    /// The session's single countdown slot.
    pub countdown: Countdown,
    /// Creation timestamp, surfaced in the session summary.
    pub created_at: SystemTime,
}

impl Session {
    /// Build a fresh lobby session around a validated question set.
    pub fn new(code: String, name: String, questions: Vec<Question>) -> Self {
        Self {
            code,
            name,
            questions,
            host: None,
            players: IndexMap::new(),
            status: SessionStatus::Lobby,
            current_index: 0,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            seconds_left: 0,
            answers_open: false,
            countdown: Countdown::default(),
            created_at: SystemTime::now(),
        }
    }

    /// The question at `current_index`, if any remain.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// Join or reconnect a player.
    ///
    /// A case-insensitive name match against a player whose old connection is
    /// no longer live rebinds that record (score and answers intact) to
    /// `conn`, keeping its roster position. A match against a live connection
    /// is a duplicate. Without a match, new players are only admitted while
    /// the session is still in the lobby.
    pub fn join(
        &mut self,
        conn: ConnectionId,
        name: &str,
        is_live: impl Fn(ConnectionId) -> bool,
    ) -> Result<JoinOutcome, JoinRejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JoinRejection::EmptyName);
        }

        let matched = self
            .players
            .iter()
            .find(|(_, player)| player.name.eq_ignore_ascii_case(name))
            .map(|(conn, _)| *conn);

        if let Some(old_conn) = matched {
            if old_conn == conn {
                return Ok(JoinOutcome::Reconnected);
            }
            if is_live(old_conn) {
                return Err(JoinRejection::DuplicateName(name.to_string()));
            }
            if let Some((index, _, player)) = self.players.shift_remove_full(&old_conn) {
                self.players.insert_before(index, conn, player);
            }
            return Ok(JoinOutcome::Reconnected);
        }

        if self.status != SessionStatus::Lobby {
            return Err(JoinRejection::AlreadyStarted);
        }

        self.players.insert(conn, Player::new(name));
        Ok(JoinOutcome::Joined)
    }

    /// Move the session from lobby to playing with a clamped time limit.
    pub fn begin_playing(&mut self, time_limit_secs: Option<u32>) -> Result<(), InvalidTransition> {
        self.advance_status(SessionStatus::Playing)?;
        self.time_limit_secs = time_limit_secs
            .unwrap_or(DEFAULT_TIME_LIMIT_SECS)
            .clamp(MIN_TIME_LIMIT_SECS, MAX_TIME_LIMIT_SECS);
        self.current_index = 0;
        self.reset_answers();
        Ok(())
    }

    /// Move the session from playing to finished.
    pub fn mark_finished(&mut self) -> Result<(), InvalidTransition> {
        self.advance_status(SessionStatus::Finished)
    }

    fn advance_status(&mut self, to: SessionStatus) -> Result<(), InvalidTransition> {
        let valid = matches!(
            (self.status, to),
            (SessionStatus::Lobby, SessionStatus::Playing)
                | (SessionStatus::Playing, SessionStatus::Finished)
        );
        if !valid {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Clear every player's answer state ahead of a new question.
    pub fn reset_answers(&mut self) {
        for player in self.players.values_mut() {
            player.current_answer = None;
            player.answer_time_remaining = None;
        }
    }

    /// Record a player's answer for the active question.
    ///
    /// The first submission freezes the countdown value as the player's
    /// answer speed; later submissions only change the selected option.
    /// Returns `false` if the connection is not a registered player.
    pub fn record_answer(&mut self, conn: ConnectionId, option: usize) -> bool {
        let remaining = self.seconds_left;
        let Some(player) = self.players.get_mut(&conn) else {
            return false;
        };
        if player.current_answer.is_none() {
            player.answer_time_remaining = Some(remaining);
        }
        player.current_answer = Some(option);
        true
    }

    /// Number of players that have answered the active question.
    pub fn answered_count(&self) -> usize {
        self.players
            .values()
            .filter(|player| player.current_answer.is_some())
            .count()
    }

    /// Per-option tally of current selections across all players.
    pub fn option_tally(&self) -> [u32; OPTION_COUNT] {
        let mut tally = [0u32; OPTION_COUNT];
        for player in self.players.values() {
            if let Some(option) = player.current_answer {
                if let Some(slot) = tally.get_mut(option) {
                    *slot += 1;
                }
            }
        }
        tally
    }

    /// Current roster in join order.
    pub fn roster(&self) -> Vec<StandingEntry> {
        self.players
            .values()
            .map(|player| StandingEntry {
                name: player.name.clone(),
                score: player.score,
            })
            .collect()
    }

    /// All players sorted descending by score, ties keeping join order.
    pub fn standings(&self) -> Vec<StandingEntry> {
        let mut standings = self.roster();
        standings.sort_by_key(|entry| Reverse(entry.score));
        standings
    }

    /// Score the active question for every player and advance past it.
    ///
    /// Returns `None` when no question is active. The question index is only
    /// advanced here, after results have been computed, so it can never skip
    /// past an unscored question.
    pub fn score_round(&mut self) -> Option<RoundOutcome> {
        let question = self.questions.get(self.current_index)?;
        let correct_index = question.correct_index;
        let correct_text = question
            .options
            .get(correct_index)
            .cloned()
            .unwrap_or_default();
        let time_limit = self.time_limit_secs;

        self.answers_open = false;

        let mut results: Vec<RoundResult> = self
            .players
            .values_mut()
            .map(|player| {
                let correct = player.current_answer == Some(correct_index);
                let points = compute_points(correct, player.answer_time_remaining, time_limit);
                player.score += points;
                RoundResult {
                    name: player.name.clone(),
                    answer: player.current_answer,
                    correct,
                    points,
                    total_score: player.score,
                    seconds_taken: player
                        .answer_time_remaining
                        .map(|remaining| time_limit.saturating_sub(remaining)),
                }
            })
            .collect();
        results.sort_by_key(|result| Reverse(result.total_score));

        self.current_index += 1;

        Some(RoundOutcome {
            correct_index,
            correct_text,
            results,
            has_more: self.current_index < self.questions.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn question(correct_index: usize) -> Question {
        Question {
            text: "What is the capital of France?".into(),
            options: vec!["Lyon".into(), "Paris".into(), "Nice".into(), "Lille".into()],
            correct_index,
        }
    }

    fn session_with_questions(count: usize) -> Session {
        Session::new(
            "ABC123".into(),
            "Geography".into(),
            (0..count).map(|_| question(1)).collect(),
        )
    }

    fn never_live(_: ConnectionId) -> bool {
        false
    }

    #[test]
    fn status_only_moves_forward() {
        let mut session = session_with_questions(1);
        session.begin_playing(None).unwrap();
        assert_eq!(session.status, SessionStatus::Playing);

        let err = session.begin_playing(None).unwrap_err();
        assert_eq!(err.from, SessionStatus::Playing);
        assert_eq!(session.status, SessionStatus::Playing);

        session.mark_finished().unwrap();
        assert!(session.begin_playing(None).is_err());
        assert!(session.mark_finished().is_err());
        assert_eq!(session.status, SessionStatus::Finished);
    }

    #[test]
    fn time_limit_is_clamped_at_start() {
        let mut session = session_with_questions(1);
        session.players.insert(Uuid::new_v4(), Player::new("ada"));
        session.begin_playing(Some(600)).unwrap();
        assert_eq!(session.time_limit_secs, MAX_TIME_LIMIT_SECS);

        let mut session = session_with_questions(1);
        session.begin_playing(Some(1)).unwrap();
        assert_eq!(session.time_limit_secs, MIN_TIME_LIMIT_SECS);

        let mut session = session_with_questions(1);
        session.begin_playing(None).unwrap();
        assert_eq!(session.time_limit_secs, DEFAULT_TIME_LIMIT_SECS);
    }

    #[test]
    fn duplicate_name_against_live_player_is_rejected() {
        let mut session = session_with_questions(1);
        let first = Uuid::new_v4();
        session.join(first, "Ada", never_live).unwrap();

        let second = Uuid::new_v4();
        let err = session.join(second, "ada", |conn| conn == first).unwrap_err();
        assert_eq!(err, JoinRejection::DuplicateName("ada".into()));
        assert_eq!(session.players.len(), 1);
    }

    #[test]
    fn reconnect_preserves_score_and_roster_position() {
        let mut session = session_with_questions(1);
        let ada_old = Uuid::new_v4();
        let grace = Uuid::new_v4();
        session.join(ada_old, "Ada", never_live).unwrap();
        session.join(grace, "Grace", never_live).unwrap();
        session.players[&ada_old].score = 900;

        let ada_new = Uuid::new_v4();
        let outcome = session.join(ada_new, "ADA", never_live).unwrap();
        assert_eq!(outcome, JoinOutcome::Reconnected);
        assert!(!session.players.contains_key(&ada_old));
        assert_eq!(session.players[&ada_new].score, 900);
        // Ada keeps her original position ahead of Grace.
        assert_eq!(session.players.get_index_of(&ada_new), Some(0));
    }

    #[test]
    fn new_player_cannot_join_after_start() {
        let mut session = session_with_questions(1);
        session.join(Uuid::new_v4(), "Ada", never_live).unwrap();
        session.begin_playing(None).unwrap();

        let err = session
            .join(Uuid::new_v4(), "Grace", never_live)
            .unwrap_err();
        assert_eq!(err, JoinRejection::AlreadyStarted);
    }

    #[test]
    fn reconnect_is_allowed_after_start() {
        let mut session = session_with_questions(1);
        let ada_old = Uuid::new_v4();
        session.join(ada_old, "Ada", never_live).unwrap();
        session.begin_playing(None).unwrap();

        let ada_new = Uuid::new_v4();
        let outcome = session.join(ada_new, "ada", never_live).unwrap();
        assert_eq!(outcome, JoinOutcome::Reconnected);
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut session = session_with_questions(1);
        let err = session.join(Uuid::new_v4(), "   ", never_live).unwrap_err();
        assert_eq!(err, JoinRejection::EmptyName);
    }

    #[test]
    fn first_answer_freezes_time_remaining() {
        let mut session = session_with_questions(1);
        let conn = Uuid::new_v4();
        session.join(conn, "Ada", never_live).unwrap();
        session.begin_playing(Some(10)).unwrap();

        session.seconds_left = 8;
        assert!(session.record_answer(conn, 0));
        session.seconds_left = 3;
        assert!(session.record_answer(conn, 1));

        let player = &session.players[&conn];
        assert_eq!(player.current_answer, Some(1));
        assert_eq!(player.answer_time_remaining, Some(8));
    }

    #[test]
    fn answer_from_unknown_connection_is_ignored() {
        let mut session = session_with_questions(1);
        assert!(!session.record_answer(Uuid::new_v4(), 0));
    }

    #[test]
    fn score_round_awards_speed_weighted_points() {
        let mut session = session_with_questions(2);
        let fast = Uuid::new_v4();
        let slow = Uuid::new_v4();
        let wrong = Uuid::new_v4();
        session.join(fast, "Fast", never_live).unwrap();
        session.join(slow, "Slow", never_live).unwrap();
        session.join(wrong, "Wrong", never_live).unwrap();
        session.begin_playing(Some(10)).unwrap();

        session.seconds_left = 8;
        session.record_answer(fast, 1);
        session.seconds_left = 2;
        session.record_answer(slow, 1);
        session.record_answer(wrong, 3);

        let outcome = session.score_round().unwrap();
        assert_eq!(outcome.correct_index, 1);
        assert_eq!(outcome.correct_text, "Paris");
        assert!(outcome.has_more);
        assert_eq!(session.current_index, 1);

        assert_eq!(outcome.results[0].name, "Fast");
        assert_eq!(outcome.results[0].points, 900);
        assert_eq!(outcome.results[0].seconds_taken, Some(2));
        assert_eq!(outcome.results[1].name, "Slow");
        assert_eq!(outcome.results[1].points, 600);
        assert_eq!(outcome.results[2].name, "Wrong");
        assert_eq!(outcome.results[2].points, 0);
        assert!(!outcome.results[2].correct);
    }

    #[test]
    fn silent_player_scores_zero() {
        let mut session = session_with_questions(1);
        let silent = Uuid::new_v4();
        session.join(silent, "Silent", never_live).unwrap();
        session.begin_playing(None).unwrap();

        let outcome = session.score_round().unwrap();
        assert_eq!(outcome.results[0].points, 0);
        assert_eq!(outcome.results[0].answer, None);
        assert_eq!(outcome.results[0].seconds_taken, None);
        assert!(!outcome.has_more);
    }

    #[test]
    fn score_round_past_last_question_is_none() {
        let mut session = session_with_questions(1);
        session.join(Uuid::new_v4(), "Ada", never_live).unwrap();
        session.begin_playing(None).unwrap();
        assert!(session.score_round().is_some());
        assert!(session.score_round().is_none());
        assert_eq!(session.current_index, 1);
    }

    #[test]
    fn standings_are_stable_for_equal_scores() {
        let mut session = session_with_questions(1);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();
        session.join(first, "First", never_live).unwrap();
        session.join(second, "Second", never_live).unwrap();
        session.join(third, "Third", never_live).unwrap();
        session.players[&first].score = 500;
        session.players[&second].score = 900;
        session.players[&third].score = 500;

        let standings = session.standings();
        assert_eq!(standings[0].name, "Second");
        assert_eq!(standings[1].name, "First");
        assert_eq!(standings[2].name, "Third");
    }
}
