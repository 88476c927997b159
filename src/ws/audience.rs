//! Audience message handlers
//!
//! The browser holds the ballot receipt, so a cast carries the device's
//! previous pick along and the store moves a count instead of adding one.
//! Everything the client checks locally is revalidated here against the
//! live round before any delta is applied.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::store::TallyDelta;
use crate::types::{now_ms, ActiveInteraction, OptionId};
use std::sync::Arc;

pub async fn handle_cast_vote(
    state: &Arc<AppState>,
    session_id: String,
    option_id: OptionId,
    previous_option_id: Option<OptionId>,
    msg_id: String,
) -> Option<ServerMessage> {
    tracing::info!(
        "Vote: option={}, previous={:?}, msg_id={}",
        option_id,
        previous_option_id,
        msg_id
    );

    let round = match state.store.interaction() {
        ActiveInteraction::Vote(round) => round,
        ActiveInteraction::None => {
            tracing::warn!("Vote received but no active round");
            return Some(error("NO_ACTIVE_ROUND", "No voting round is running"));
        }
    };

    if round.session_id != session_id {
        // A reset rotated the session out from under this client; its old
        // receipt counts for nothing and the next interaction snapshot lets
        // it vote fresh.
        tracing::info!(
            "Vote for stale session {} (live: {})",
            session_id,
            round.session_id
        );
        return Some(error("STALE_SESSION", "This voting round was reset"));
    }

    if !round.accepting_votes(now_ms()) {
        return Some(error("VOTING_CLOSED", "Voting has ended"));
    }

    if round.option(&option_id).is_none() {
        return Some(error("UNKNOWN_OPTION", "That option is not part of this round"));
    }
    if let Some(previous) = &previous_option_id {
        if round.option(previous).is_none() {
            return Some(error("UNKNOWN_OPTION", "That option is not part of this round"));
        }
    }

    if previous_option_id.as_deref() == Some(option_id.as_str()) {
        // Re-click of the recorded option: ack without touching counts
        tracing::debug!("Duplicate pick, returning ack");
        return Some(ServerMessage::VoteAck { msg_id });
    }

    let delta = match previous_option_id.as_deref() {
        Some(previous) => TallyDelta::changed_vote(previous, &option_id),
        None => TallyDelta::first_vote(&option_id),
    };

    match state.store.apply_tally_delta(delta).await {
        Ok(()) => Some(ServerMessage::VoteAck { msg_id }),
        Err(e) => {
            tracing::error!("Vote failed: {}", e);
            Some(error("VOTE_FAILED", "Vote failed - please try again!"))
        }
    }
}

fn error(code: &str, msg: &str) -> ServerMessage {
    ServerMessage::Error {
        code: code.to_string(),
        msg: msg.to_string(),
    }
}
