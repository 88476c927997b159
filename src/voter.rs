//! Audience-side vote casting and the derived tally view.

use std::sync::Arc;

use crate::receipt::ReceiptStore;
use crate::store::{StoreResult, TallyDelta, TallyStore};
use crate::types::{now_ms, ActiveInteraction, OptionId, TallyState, VoteOption, VoteRound};

/// What happened to a cast attempt. Everything except `Recorded` leaves the
/// tally and the local receipt untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    Recorded,
    /// Re-click of the already-recorded option; counts change only on the
    /// first cast.
    SameOption,
    VotingClosed,
    UnknownOption,
    NoActiveRound,
}

/// One audience device. Holds at most one active vote per session id and may
/// change it any number of times while the round accepts votes.
pub struct VotingClient {
    store: Arc<dyn TallyStore>,
    receipts: Arc<dyn ReceiptStore>,
}

impl VotingClient {
    pub fn new(store: Arc<dyn TallyStore>, receipts: Arc<dyn ReceiptStore>) -> Self {
        Self { store, receipts }
    }

    fn current_round(&self) -> Option<VoteRound> {
        match self.store.interaction() {
            ActiveInteraction::Vote(round) => Some(round),
            ActiveInteraction::None => None,
        }
    }

    /// The option recorded for the live session, if this device has voted.
    ///
    /// A receipt from a rotated-away session never matches the live key, so
    /// after a reset this device counts as not having voted even though the
    /// old receipt still exists.
    pub fn selection(&self) -> Option<OptionId> {
        let round = self.current_round()?;
        self.receipts.get(&round.session_id)
    }

    pub fn has_voted(&self) -> bool {
        self.selection().is_some()
    }

    /// Cast or change this device's vote.
    ///
    /// A first vote bumps the option count and the total together; a change
    /// moves one count to another and leaves the total alone. The receipt
    /// advances only after the store acknowledges, so a failed cast retried
    /// with the same option stays safe.
    pub async fn cast_vote(&self, option_id: &str) -> StoreResult<CastOutcome> {
        let Some(round) = self.current_round() else {
            return Ok(CastOutcome::NoActiveRound);
        };
        if !round.accepting_votes(now_ms()) {
            return Ok(CastOutcome::VotingClosed);
        }
        if round.option(option_id).is_none() {
            return Ok(CastOutcome::UnknownOption);
        }

        let previous = self.receipts.get(&round.session_id);
        if previous.as_deref() == Some(option_id) {
            return Ok(CastOutcome::SameOption);
        }

        let delta = match previous.as_deref() {
            Some(old) => TallyDelta::changed_vote(old, option_id),
            None => TallyDelta::first_vote(option_id),
        };
        self.store.apply_tally_delta(delta).await?;
        self.receipts.set(&round.session_id, option_id);
        Ok(CastOutcome::Recorded)
    }
}

/// One option's slice of the display bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TallyRow {
    pub option: VoteOption,
    pub votes: u32,
    pub percent: f64,
}

/// Display-side derived numbers, recomputed from each tally snapshot and
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TallyView {
    pub rows: Vec<TallyRow>,
    pub total_votes: u32,
}

impl TallyView {
    /// With no votes yet, every option shows an even split rather than a
    /// division by zero.
    pub fn build(round: &VoteRound, tally: &TallyState) -> Self {
        let total = tally.total_votes;
        let rows = round
            .options
            .iter()
            .map(|option| {
                let votes = tally.votes_for(&option.id);
                let percent = if total == 0 {
                    100.0 / round.options.len() as f64
                } else {
                    votes as f64 / total as f64 * 100.0
                };
                TallyRow {
                    option: option.clone(),
                    votes,
                    percent,
                }
            })
            .collect();
        Self {
            rows,
            total_votes: total,
        }
    }

    /// The option currently ahead. Nobody leads an empty tally.
    pub fn leader(&self) -> Option<&TallyRow> {
        if self.total_votes == 0 {
            return None;
        }
        self.rows.iter().max_by_key(|row| row.votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::MemoryReceipts;
    use crate::session::SessionController;
    use crate::store::MemoryStore;

    fn options() -> Vec<VoteOption> {
        vec![
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
        ]
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        gm: SessionController,
    }

    impl Fixture {
        async fn live() -> Self {
            let store = Arc::new(MemoryStore::new());
            let gm = SessionController::new(store.clone());
            gm.activate("Fight or flee?".to_string(), options(), 60)
                .await
                .unwrap();
            Self { store, gm }
        }

        fn client(&self) -> VotingClient {
            VotingClient::new(self.store.clone(), Arc::new(MemoryReceipts::new()))
        }

        fn assert_consistent(&self) {
            let tally = self.store.tally();
            assert_eq!(tally.total_votes, tally.counts.values().sum::<u32>());
        }
    }

    #[tokio::test]
    async fn test_first_vote_is_recorded() {
        let fx = Fixture::live().await;
        let client = fx.client();
        assert!(!client.has_voted());

        assert_eq!(client.cast_vote("a").await.unwrap(), CastOutcome::Recorded);

        assert_eq!(client.selection(), Some("a".to_string()));
        assert_eq!(fx.store.tally().votes_for("a"), 1);
        assert_eq!(fx.store.tally().total_votes, 1);
        fx.assert_consistent();
    }

    #[tokio::test]
    async fn test_recasting_same_option_is_idempotent() {
        let fx = Fixture::live().await;
        let client = fx.client();

        assert_eq!(client.cast_vote("a").await.unwrap(), CastOutcome::Recorded);
        assert_eq!(client.cast_vote("a").await.unwrap(), CastOutcome::SameOption);

        assert_eq!(fx.store.tally().votes_for("a"), 1);
        assert_eq!(fx.store.tally().total_votes, 1);
    }

    #[tokio::test]
    async fn test_vote_change_moves_count_without_double_counting() {
        let fx = Fixture::live().await;
        let client = fx.client();

        client.cast_vote("a").await.unwrap();
        assert_eq!(client.cast_vote("b").await.unwrap(), CastOutcome::Recorded);

        let tally = fx.store.tally();
        assert_eq!(tally.votes_for("a"), 0);
        assert_eq!(tally.votes_for("b"), 1);
        assert_eq!(tally.total_votes, 1);
        assert_eq!(client.selection(), Some("b".to_string()));
        fx.assert_consistent();
    }

    #[tokio::test]
    async fn test_closed_round_rejects_casts_regardless_of_receipt() {
        let fx = Fixture::live().await;
        let client = fx.client();
        client.cast_vote("a").await.unwrap();

        fx.gm.close().await.unwrap();

        // Neither a change nor a fresh client gets through
        assert_eq!(client.cast_vote("b").await.unwrap(), CastOutcome::VotingClosed);
        let fresh = fx.client();
        assert_eq!(fresh.cast_vote("b").await.unwrap(), CastOutcome::VotingClosed);
        assert_eq!(fx.store.tally().total_votes, 1);
    }

    #[tokio::test]
    async fn test_expired_countdown_rejects_casts_even_while_open() {
        let fx = Fixture::live().await;
        // Backdate the round past its own deadline with the flag still open
        let mut round = fx.store.interaction().vote().unwrap().clone();
        round.started_at -= 61_000;
        fx.store
            .put_interaction(ActiveInteraction::Vote(round))
            .await
            .unwrap();

        let client = fx.client();
        assert_eq!(client.cast_vote("a").await.unwrap(), CastOutcome::VotingClosed);
    }

    #[tokio::test]
    async fn test_reset_orphans_old_receipt() {
        let fx = Fixture::live().await;
        let receipts = Arc::new(MemoryReceipts::new());
        let client = VotingClient::new(fx.store.clone(), receipts.clone());

        client.cast_vote("a").await.unwrap();
        let old_session = fx.store.interaction().vote().unwrap().session_id.clone();

        fx.gm.reset_votes().await.unwrap();

        // The old receipt still exists but no longer matches the live session
        assert_eq!(receipts.get(&old_session), Some("a".to_string()));
        assert!(!client.has_voted());

        // Voting again counts as a first vote in the new session
        assert_eq!(client.cast_vote("b").await.unwrap(), CastOutcome::Recorded);
        let tally = fx.store.tally();
        assert_eq!(tally.votes_for("a"), 0);
        assert_eq!(tally.votes_for("b"), 1);
        assert_eq!(tally.total_votes, 1);
    }

    #[tokio::test]
    async fn test_unknown_option_and_idle_slot() {
        let fx = Fixture::live().await;
        let client = fx.client();
        assert_eq!(client.cast_vote("z").await.unwrap(), CastOutcome::UnknownOption);

        fx.gm.deactivate().await.unwrap();
        assert_eq!(client.cast_vote("a").await.unwrap(), CastOutcome::NoActiveRound);
        assert!(!client.has_voted());
    }

    #[tokio::test]
    async fn test_view_even_split_with_no_votes() {
        let fx = Fixture::live().await;
        let round = fx.store.interaction().vote().unwrap().clone();

        let view = TallyView::build(&round, &fx.store.tally());
        assert_eq!(view.total_votes, 0);
        assert!(view.leader().is_none());
        for row in &view.rows {
            assert_eq!(row.percent, 50.0);
        }
    }

    #[tokio::test]
    async fn test_view_percentages_and_leader() {
        let fx = Fixture::live().await;
        let round = fx.store.interaction().vote().unwrap().clone();

        for pick in ["a", "b", "b"] {
            fx.client().cast_vote(pick).await.unwrap();
        }

        let view = TallyView::build(&round, &fx.store.tally());
        assert_eq!(view.total_votes, 3);
        let leader = view.leader().unwrap();
        assert_eq!(leader.option.id, "b");
        assert_eq!(leader.votes, 2);
        assert!((leader.percent - 66.666).abs() < 0.01);
    }
}
