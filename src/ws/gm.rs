//! GM-only command handlers
//!
//! All handlers in this module require the GM role. Authorization is checked
//! in the main dispatch layer before these are called.
//!
//! Successful commands return no direct response: the resulting document
//! snapshots fan out to every subscriber, the GM's own connection included.
//! Failures come back with the specific error text, store errors included,
//! so the operator can retry manually.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::VoteOption;
use std::sync::Arc;

pub async fn handle_activate_vote(
    state: &Arc<AppState>,
    question: String,
    options: Vec<VoteOption>,
    timer_seconds: u32,
) -> Option<ServerMessage> {
    tracing::info!(
        "GM activating vote: {:?} ({} options, {}s timer)",
        question,
        options.len(),
        timer_seconds
    );
    match state.controller.activate(question, options, timer_seconds).await {
        Ok(round) => {
            tracing::info!("Voting round {} is live", round.session_id);
            None
        }
        Err(e) => Some(ServerMessage::Error {
            code: "ACTIVATE_FAILED".to_string(),
            msg: e.to_string(),
        }),
    }
}

pub async fn handle_close_voting(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("GM closing voting");
    match state.controller.close().await {
        Ok(()) => None,
        Err(e) => Some(ServerMessage::Error {
            code: "CLOSE_FAILED".to_string(),
            msg: e.to_string(),
        }),
    }
}

pub async fn handle_reopen_voting(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("GM reopening voting");
    match state.controller.reopen().await {
        Ok(()) => None,
        Err(e) => Some(ServerMessage::Error {
            code: "REOPEN_FAILED".to_string(),
            msg: e.to_string(),
        }),
    }
}

pub async fn handle_reset_votes(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("GM resetting votes");
    match state.controller.reset_votes().await {
        Ok(round) => {
            tracing::info!("Votes reset, new session {}", round.session_id);
            None
        }
        Err(e) => Some(ServerMessage::Error {
            code: "RESET_FAILED".to_string(),
            msg: e.to_string(),
        }),
    }
}

pub async fn handle_end_interaction(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("GM ending interaction");
    match state.controller.deactivate().await {
        Ok(()) => None,
        Err(e) => Some(ServerMessage::Error {
            code: "END_FAILED".to_string(),
            msg: e.to_string(),
        }),
    }
}
