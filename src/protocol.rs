use serde::{Deserialize, Serialize};

use crate::types::{ActiveInteraction, OptionId, Role, SessionId, TallyState, VoteOption};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Cast or change a vote. `previous_option_id` echoes the device's
    /// ballot receipt so the store moves a count instead of adding one.
    CastVote {
        session_id: SessionId,
        option_id: OptionId,
        #[serde(default)]
        previous_option_id: Option<OptionId>,
        msg_id: String,
    },
    // GM-only messages
    GmActivateVote {
        question: String,
        options: Vec<VoteOption>,
        timer_seconds: u32,
    },
    GmCloseVoting,
    GmReopenVoting,
    GmResetVotes,
    GmEndInteraction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        interaction: ActiveInteraction,
        tally: TallyState,
        server_now: String,
    },
    /// Full interaction snapshot. Replaces any mirrored copy wholesale;
    /// clients never merge snapshots field by field.
    Interaction {
        interaction: ActiveInteraction,
        server_now: String,
    },
    /// Full tally snapshot, sent after every vote and reset.
    Tally { tally: TallyState },
    VoteAck { msg_id: String },
    Error { code: String, msg: String },
}
