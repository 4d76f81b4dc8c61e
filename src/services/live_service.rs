//! The session lifecycle engine.
//!
//! Every inbound socket event and every countdown callback for a session runs
//! under that session's lock, so the handlers here mutate sessions without any
//! further synchronization. Authorization and validation failures bubble up as
//! [`ServiceError`] and are reported only to the connection that caused them;
//! they never mutate session state.

use std::time::Duration;

use axum::extract::ws::Message;
use tokio::{sync::mpsc, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    error::ServiceError,
    services::ws_events,
    state::{
        ConnectionEntry, ConnectionId, ConnectionRole, SharedState,
        session::{OPTION_COUNT, Session, SessionStatus},
    },
};

/// Seconds between a question's results and the next question.
const INTERLUDE_SECS: u32 = 5;
/// How long a finished session lingers before the registry drops it.
const FINISHED_CLEANUP_DELAY: Duration = Duration::from_secs(60);

/// Route one parsed client message to its handler.
pub async fn dispatch(
    state: &SharedState,
    conn: ConnectionId,
    tx: &mpsc::UnboundedSender<Message>,
    message: ClientMessage,
) -> Result<(), ServiceError> {
    match message {
        ClientMessage::HostJoin { session_id } => bind_host(state, conn, tx, &session_id).await,
        ClientMessage::PlayerJoin {
            session_id,
            player_name,
        } => join_player(state, conn, tx, &session_id, &player_name).await,
        ClientMessage::HostStart { time_limit } => start_quiz(state, conn, time_limit).await,
        ClientMessage::PlayerAnswer { option } => submit_answer(state, conn, option).await,
        ClientMessage::HostSkip => skip_question(state, conn).await,
        ClientMessage::Unknown => {
            warn!(conn = %conn, "ignoring unknown client message");
            Ok(())
        }
    }
}

/// Bind `conn` as the session's host. Last binder wins.
async fn bind_host(
    state: &SharedState,
    conn: ConnectionId,
    tx: &mpsc::UnboundedSender<Message>,
    session_id: &str,
) -> Result<(), ServiceError> {
    let handle = state
        .sessions()
        .get(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    let mut session = handle.lock().await;

    session.host = Some(conn);
    state.connections().insert(
        conn,
        ConnectionEntry {
            role: ConnectionRole::Host,
            session: session.code.clone(),
            tx: tx.clone(),
        },
    );

    ws_events::send_direct(tx, &ServerMessage::session_snapshot(&session));
    info!(session = %session.code, conn = %conn, "host bound");
    Ok(())
}

/// Join `conn` as a player, or reconnect it to an existing player record.
async fn join_player(
    state: &SharedState,
    conn: ConnectionId,
    tx: &mpsc::UnboundedSender<Message>,
    session_id: &str,
    player_name: &str,
) -> Result<(), ServiceError> {
    let handle = state
        .sessions()
        .get(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    let mut session = handle.lock().await;

    let outcome = session.join(conn, player_name, |old| state.connection_is_live(old))?;
    state.connections().insert(
        conn,
        ConnectionEntry {
            role: ConnectionRole::Player,
            session: session.code.clone(),
            tx: tx.clone(),
        },
    );

    ws_events::broadcast_roster(state, &session);
    debug!(
        session = %session.code,
        conn = %conn,
        player = %player_name.trim(),
        outcome = ?outcome,
        "player joined"
    );
    Ok(())
}

/// Host action: leave the lobby and announce the first question.
async fn start_quiz(
    state: &SharedState,
    conn: ConnectionId,
    time_limit: Option<u32>,
) -> Result<(), ServiceError> {
    let session_code = bound_session(state, conn)?;
    let handle = state
        .sessions()
        .get(&session_code)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_code}` not found")))?;
    let mut session = handle.lock().await;

    if session.host != Some(conn) {
        return Err(ServiceError::Unauthorized(
            "only the host may start the quiz".into(),
        ));
    }
    if session.players.is_empty() {
        return Err(ServiceError::Validation(
            "cannot start a quiz with no players".into(),
        ));
    }

    let time_limit = time_limit.unwrap_or_else(|| state.config().default_time_limit_secs());
    session.begin_playing(Some(time_limit))?;

    info!(
        session = %session.code,
        time_limit = session.time_limit_secs,
        players = session.players.len(),
        "quiz started"
    );
    send_question(state, &mut session);
    Ok(())
}

/// Player action: record or change an answer for the active question.
///
/// Silently ignored when the connection is not a player of a playing session
/// with an open question, per the protocol.
async fn submit_answer(
    state: &SharedState,
    conn: ConnectionId,
    option: usize,
) -> Result<(), ServiceError> {
    let Ok(session_code) = bound_session(state, conn) else {
        return Ok(());
    };
    let Some(handle) = state.sessions().get(&session_code) else {
        return Ok(());
    };
    let mut session = handle.lock().await;

    if session.status != SessionStatus::Playing || !session.answers_open {
        return Ok(());
    }
    if option >= OPTION_COUNT {
        return Ok(());
    }
    if !session.record_answer(conn, option) {
        return Ok(());
    }

    ws_events::broadcast_answer_progress(state, &session);
    Ok(())
}

/// Host action: cancel the question countdown and close the question now.
async fn skip_question(state: &SharedState, conn: ConnectionId) -> Result<(), ServiceError> {
    let session_code = bound_session(state, conn)?;
    let handle = state
        .sessions()
        .get(&session_code)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_code}` not found")))?;
    let mut session = handle.lock().await;

    if session.host != Some(conn) {
        return Err(ServiceError::Unauthorized(
            "only the host may skip a question".into(),
        ));
    }
    if session.status != SessionStatus::Playing || !session.answers_open {
        return Ok(());
    }

    // Bumps the countdown epoch, so a timer task racing us on the session
    // lock finds its epoch stale and backs off without a second end-question.
    session.countdown.cancel();
    debug!(session = %session.code, "question skipped by host");
    end_question(state, &mut session);
    Ok(())
}

/// Handle a socket disappearing, whatever its role was.
pub async fn unbind(state: &SharedState, conn: ConnectionId) {
    let Some((_, entry)) = state.connections().remove(&conn) else {
        return;
    };
    let Some(handle) = state.sessions().get(&entry.session) else {
        return;
    };
    let mut session = handle.lock().await;

    match entry.role {
        ConnectionRole::Host => {
            // A stale host socket (already superseded by a newer binder)
            // must not take the session down.
            if session.host == Some(conn) {
                session.countdown.cancel();
                ws_events::broadcast_session_ended(state, &session, "host disconnected");
                state.sessions().remove(&entry.session);
                info!(session = %entry.session, "session terminated by host disconnect");
            }
        }
        ConnectionRole::Player => {
            if session.players.shift_remove(&conn).is_some() {
                ws_events::broadcast_roster(state, &session);
                debug!(session = %entry.session, conn = %conn, "player disconnected");
            }
        }
    }
}

/// Announce the question at the current index and arm its countdown.
fn send_question(state: &SharedState, session: &mut Session) {
    if session.current_question().is_none() {
        finish(state, session);
        return;
    }

    session.reset_answers();
    session.answers_open = true;
    session.seconds_left = session.time_limit_secs;
    ws_events::announce_question(state, session);

    let epoch = session.countdown.arm();
    let task = tokio::spawn(run_question_countdown(
        state.clone(),
        session.code.clone(),
        epoch,
    ));
    session.countdown.attach(epoch, task.abort_handle());
}

/// Score the active question, announce results, and arm the interlude.
fn end_question(state: &SharedState, session: &mut Session) {
    let Some(outcome) = session.score_round() else {
        return;
    };
    ws_events::broadcast_results(state, session, &outcome);

    let is_last = !outcome.has_more;
    session.seconds_left = INTERLUDE_SECS;
    ws_events::broadcast_countdown(state, session, is_last);

    let epoch = session.countdown.arm();
    let task = tokio::spawn(run_interlude_countdown(
        state.clone(),
        session.code.clone(),
        epoch,
        is_last,
    ));
    session.countdown.attach(epoch, task.abort_handle());
}

/// Close the session lifecycle and schedule registry cleanup.
fn finish(state: &SharedState, session: &mut Session) {
    if let Err(err) = session.mark_finished() {
        warn!(session = %session.code, error = %err, "finish skipped");
        return;
    }
    session.countdown.cancel();
    ws_events::broadcast_finished(state, session);
    info!(session = %session.code, "quiz finished");

    let state = state.clone();
    let code = session.code.clone();
    tokio::spawn(async move {
        sleep(FINISHED_CLEANUP_DELAY).await;
        if state.sessions().remove(&code).is_some() {
            debug!(session = %code, "finished session cleaned up");
        }
    });
}

/// Tick the question countdown once per second until expiry.
///
/// Each iteration re-acquires the session lock and verifies its epoch, so a
/// countdown canceled by skip or host disconnect never ticks again and never
/// runs its terminal action.
async fn run_question_countdown(state: SharedState, code: String, epoch: u64) {
    loop {
        sleep(Duration::from_secs(1)).await;
        let Some(handle) = state.sessions().get(&code) else {
            return;
        };
        let mut session = handle.lock().await;
        if !session.countdown.is_current(epoch) {
            return;
        }

        session.seconds_left = session.seconds_left.saturating_sub(1);
        ws_events::broadcast_timer(&state, &session);
        if session.seconds_left == 0 {
            if session.countdown.expire(epoch) {
                end_question(&state, &mut session);
            }
            return;
        }
    }
}

/// Tick the inter-question countdown, then move on or finish.
async fn run_interlude_countdown(state: SharedState, code: String, epoch: u64, is_last: bool) {
    loop {
        sleep(Duration::from_secs(1)).await;
        let Some(handle) = state.sessions().get(&code) else {
            return;
        };
        let mut session = handle.lock().await;
        if !session.countdown.is_current(epoch) {
            return;
        }

        session.seconds_left = session.seconds_left.saturating_sub(1);
        if session.seconds_left > 0 {
            ws_events::broadcast_countdown(&state, &session, is_last);
            continue;
        }

        if session.countdown.expire(epoch) && session.status == SessionStatus::Playing {
            if is_last {
                finish(&state, &mut session);
            } else {
                send_question(&state, &mut session);
            }
        }
        return;
    }
}

/// Session code the connection is bound to, or `Unauthorized`.
fn bound_session(state: &SharedState, conn: ConnectionId) -> Result<String, ServiceError> {
    state
        .connections()
        .get(&conn)
        .map(|entry| entry.session.clone())
        .ok_or_else(|| ServiceError::Unauthorized("connection is not bound to a session".into()))
}
