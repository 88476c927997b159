use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type SessionId = String;
pub type OptionId = String;

/// Milliseconds since the Unix epoch, the timestamp base the countdown runs on.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Gm,
    Display,
    Audience,
}

/// One choice the audience can pick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteOption {
    pub id: OptionId,
    pub label: String,
    pub emoji: String,
}

/// Configuration of a live voting round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRound {
    /// Rotates whenever previously cast votes are invalidated (new round or
    /// explicit reset). Ballot receipts are keyed by this.
    pub session_id: SessionId,
    pub question: String,
    /// 2 or 3 options with ids unique within the round.
    pub options: Vec<VoteOption>,
    /// Authoritative open/closed flag, written only by the GM.
    pub is_open: bool,
    /// Countdown baseline in epoch milliseconds; reset whenever the round
    /// (re)opens.
    pub started_at: i64,
    pub timer_seconds: u32,
}

impl VoteRound {
    pub fn remaining_seconds(&self, now_ms: i64) -> u32 {
        let elapsed = (now_ms - self.started_at).max(0) / 1000;
        u32::try_from(elapsed).map_or(0, |e| self.timer_seconds.saturating_sub(e))
    }

    /// Closed means `!is_open` OR the countdown ran out, whichever comes
    /// first. The GM's flag stays authoritative; the deadline is a soft
    /// layer clients re-evaluate on every tick and every snapshot.
    pub fn accepting_votes(&self, now_ms: i64) -> bool {
        self.is_open && self.remaining_seconds(now_ms) > 0
    }

    pub fn option(&self, id: &str) -> Option<&VoteOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// The single live interaction slot. A tagged union so vote-only fields
/// cannot exist while nothing is running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActiveInteraction {
    #[default]
    None,
    Vote(VoteRound),
}

impl ActiveInteraction {
    pub fn vote(&self) -> Option<&VoteRound> {
        match self {
            ActiveInteraction::Vote(round) => Some(round),
            ActiveInteraction::None => None,
        }
    }
}

/// Live vote counts for the current round.
///
/// No session id is stored here; exactly one tally document exists and
/// belongs to the current round by convention. Every state reachable through
/// the protocol keeps `total_votes == sum(counts)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TallyState {
    pub counts: HashMap<OptionId, u32>,
    pub total_votes: u32,
}

impl TallyState {
    /// One zeroed entry per option; written at activation and on reset.
    pub fn zeroed(options: &[VoteOption]) -> Self {
        Self {
            counts: options.iter().map(|o| (o.id.clone(), 0)).collect(),
            total_votes: 0,
        }
    }

    pub fn votes_for(&self, option_id: &str) -> u32 {
        self.counts.get(option_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(is_open: bool, started_at: i64, timer_seconds: u32) -> VoteRound {
        VoteRound {
            session_id: "vote-test".to_string(),
            question: "Fight or flee?".to_string(),
            options: vec![
                VoteOption {
                    id: "a".to_string(),
                    label: "Fight".to_string(),
                    emoji: "⚔️".to_string(),
                },
                VoteOption {
                    id: "b".to_string(),
                    label: "Flee".to_string(),
                    emoji: "🏃".to_string(),
                },
            ],
            is_open,
            started_at,
            timer_seconds,
        }
    }

    #[test]
    fn test_remaining_seconds_counts_down() {
        let r = round(true, 10_000, 60);
        assert_eq!(r.remaining_seconds(10_000), 60);
        assert_eq!(r.remaining_seconds(25_000), 45);
        assert_eq!(r.remaining_seconds(70_000), 0);
        // Clock skew: a client slightly behind the GM sees the full timer
        assert_eq!(r.remaining_seconds(9_000), 60);
        // Far past the deadline, beyond what fits in u32 seconds
        assert_eq!(r.remaining_seconds(i64::MAX / 2), 0);
    }

    #[test]
    fn test_accepting_votes_needs_open_flag_and_time() {
        let open = round(true, 10_000, 60);
        assert!(open.accepting_votes(10_000));
        assert!(!open.accepting_votes(70_000));

        let closed = round(false, 10_000, 60);
        assert!(!closed.accepting_votes(10_000));
    }

    #[test]
    fn test_interaction_document_schema() {
        let json = serde_json::to_value(ActiveInteraction::Vote(round(true, 10_000, 60))).unwrap();
        assert_eq!(json["type"], "vote");
        assert_eq!(json["sessionId"], "vote-test");
        assert_eq!(json["isOpen"], true);
        assert_eq!(json["startedAt"], 10_000);
        assert_eq!(json["timerSeconds"], 60);
        assert_eq!(json["options"][0]["id"], "a");

        let none = serde_json::to_value(ActiveInteraction::None).unwrap();
        assert_eq!(none, serde_json::json!({ "type": "none" }));
    }

    #[test]
    fn test_tally_document_schema() {
        let tally = TallyState::zeroed(&round(true, 0, 60).options);
        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(json["totalVotes"], 0);
        assert_eq!(json["counts"]["a"], 0);
        assert_eq!(json["counts"]["b"], 0);
    }

    #[test]
    fn test_votes_for_missing_option_is_zero() {
        let tally = TallyState::default();
        assert_eq!(tally.votes_for("a"), 0);
    }
}
