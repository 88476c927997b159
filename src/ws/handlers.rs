//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! GM authorization is checked here, then dispatched to role-specific
//! handler modules.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::{audience, gm};

/// Macro to check GM authorization and return early if unauthorized
macro_rules! check_gm {
    ($role:expr, $action:expr) => {
        if *$role != Role::Gm {
            return Some(ServerMessage::Error {
                code: "UNAUTHORIZED".to_string(),
                msg: format!("Only the GM can {}", $action),
            });
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Audience messages
        ClientMessage::CastVote {
            session_id,
            option_id,
            previous_option_id,
            msg_id,
        } => {
            audience::handle_cast_vote(state, session_id, option_id, previous_option_id, msg_id)
                .await
        }

        // GM-only commands (authorization checked before dispatch)
        ClientMessage::GmActivateVote {
            question,
            options,
            timer_seconds,
        } => {
            check_gm!(role, "activate voting");
            gm::handle_activate_vote(state, question, options, timer_seconds).await
        }

        ClientMessage::GmCloseVoting => {
            check_gm!(role, "close voting");
            gm::handle_close_voting(state).await
        }

        ClientMessage::GmReopenVoting => {
            check_gm!(role, "reopen voting");
            gm::handle_reopen_voting(state).await
        }

        ClientMessage::GmResetVotes => {
            check_gm!(role, "reset votes");
            gm::handle_reset_votes(state).await
        }

        ClientMessage::GmEndInteraction => {
            check_gm!(role, "end the interaction");
            gm::handle_end_interaction(state).await
        }
    }
}
