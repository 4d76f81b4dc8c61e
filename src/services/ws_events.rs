//! Broadcast gateway: delivery of server messages to a session's room.
//!
//! Delivery is best-effort. A member whose socket is gone simply receives
//! nothing; serialization failures are logged and swallowed.

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::warn;

use crate::{
    dto::ws::{PlayerSummary, PodiumEntry, ServerMessage},
    state::{
        ConnectionId, SharedState,
        session::{RoundOutcome, Session},
    },
};

/// Number of players shown on the final podium.
const PODIUM_SIZE: usize = 3;

/// Serialize a message and push it onto a connection's writer channel.
pub fn send_direct(tx: &mpsc::UnboundedSender<Message>, message: &ServerMessage) {
    let Some(payload) = encode(message) else {
        return;
    };
    let _ = tx.send(Message::Text(payload.into()));
}

/// Deliver a message to one connection, if it is still bound.
pub fn send_to(state: &SharedState, conn: ConnectionId, message: &ServerMessage) {
    let Some(tx) = state.connections().get(&conn).map(|entry| entry.tx.clone()) else {
        return;
    };
    send_direct(&tx, message);
}

/// Deliver a message to every member of the session's room.
pub fn broadcast_room(state: &SharedState, session: &Session, message: &ServerMessage) {
    let Some(payload) = encode(message) else {
        return;
    };
    for conn in session.host.iter().chain(session.players.keys()) {
        if let Some(entry) = state.connections().get(conn) {
            let _ = entry.tx.send(Message::Text(payload.clone().into()));
        }
    }
}

/// Deliver a message to the bound host only.
pub fn send_host(state: &SharedState, session: &Session, message: &ServerMessage) {
    if let Some(host) = session.host {
        send_to(state, host, message);
    }
}

/// Report a failure privately to the connection that caused it.
pub fn send_error(tx: &mpsc::UnboundedSender<Message>, message: String) {
    send_direct(tx, &ServerMessage::Error { message });
}

/// Broadcast the roster plus quiz name to the room.
pub fn broadcast_roster(state: &SharedState, session: &Session) {
    broadcast_room(state, session, &ServerMessage::roster(session));
}

/// Announce the current question to the room and its correct index to the host.
pub fn announce_question(state: &SharedState, session: &Session) {
    let Some(question) = session.current_question() else {
        return;
    };
    broadcast_room(
        state,
        session,
        &ServerMessage::QuizQuestion {
            question: question.text.clone(),
            options: question.options.clone(),
            number: session.current_index + 1,
            total: session.questions.len(),
            time_limit: session.time_limit_secs,
            player_count: session.players.len(),
        },
    );
    send_host(
        state,
        session,
        &ServerMessage::HostCorrectAnswer {
            correct_index: question.correct_index,
        },
    );
}

/// Broadcast the question countdown value currently on the session.
pub fn broadcast_timer(state: &SharedState, session: &Session) {
    broadcast_room(
        state,
        session,
        &ServerMessage::QuizTimer {
            seconds_left: session.seconds_left,
        },
    );
}

/// Broadcast answered/total progress and send the per-option tally to the host.
pub fn broadcast_answer_progress(state: &SharedState, session: &Session) {
    broadcast_room(
        state,
        session,
        &ServerMessage::HostAnswerCount {
            answered: session.answered_count(),
            total: session.players.len(),
        },
    );
    send_host(
        state,
        session,
        &ServerMessage::HostAnswerStats {
            tally: session.option_tally().to_vec(),
        },
    );
}

/// Broadcast the results of a finished question.
pub fn broadcast_results(state: &SharedState, session: &Session, outcome: &RoundOutcome) {
    broadcast_room(
        state,
        session,
        &ServerMessage::QuizResults {
            correct_index: outcome.correct_index,
            correct_text: outcome.correct_text.clone(),
            results: outcome.results.iter().cloned().map(Into::into).collect(),
        },
    );
}

/// Broadcast an inter-question countdown tick.
pub fn broadcast_countdown(state: &SharedState, session: &Session, is_last: bool) {
    broadcast_room(
        state,
        session,
        &ServerMessage::QuizCountdown {
            seconds_left: session.seconds_left,
            is_last,
        },
    );
}

/// Broadcast the podium and full standings.
pub fn broadcast_finished(state: &SharedState, session: &Session) {
    let standings: Vec<PlayerSummary> = session
        .standings()
        .into_iter()
        .map(PlayerSummary::from)
        .collect();
    let podium = standings
        .iter()
        .take(PODIUM_SIZE)
        .enumerate()
        .map(|(index, entry)| PodiumEntry {
            rank: index + 1,
            name: entry.name.clone(),
            score: entry.score,
        })
        .collect();
    broadcast_room(
        state,
        session,
        &ServerMessage::QuizFinished { podium, standings },
    );
}

/// Tell the room the session no longer exists.
pub fn broadcast_session_ended(state: &SharedState, session: &Session, reason: &str) {
    broadcast_room(
        state,
        session,
        &ServerMessage::SessionEnded {
            reason: reason.to_string(),
        },
    );
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(error = %err, "failed to serialize server message");
            None
        }
    }
}
