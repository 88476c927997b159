//! The tally store: the shared document layer every client talks through.
//!
//! Two logical documents exist, the active interaction (round configuration)
//! and the vote tally. The store exposes exactly three primitives: full
//! overwrite, atomic multi-field delta, and snapshot subscription. The GM
//! alone overwrites documents; voting clients only ever apply deltas.
//!
//! The two documents update independently. There is no cross-document
//! atomicity, so subscribers must tolerate a brief window where one document
//! reflects a reset the other does not yet.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::types::{ActiveInteraction, OptionId, TallyState};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by tally store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// A relative adjustment the store applies in one step, both-or-neither.
///
/// Deltas exist so concurrent voters never race a read-modify-write on the
/// shared counters; the store itself applies the `+N`/`-N`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TallyDelta {
    pub counts: Vec<(OptionId, i64)>,
    pub total_votes: i64,
}

impl TallyDelta {
    /// A voter's first vote this session: one count up, the total up.
    pub fn first_vote(option_id: &str) -> Self {
        Self {
            counts: vec![(option_id.to_string(), 1)],
            total_votes: 1,
        }
    }

    /// A changed vote moves one count to another. Not a new vote, so the
    /// total is untouched.
    pub fn changed_vote(from: &str, to: &str) -> Self {
        Self {
            counts: vec![(from.to_string(), -1), (to.to_string(), 1)],
            total_votes: 0,
        }
    }
}

#[async_trait]
pub trait TallyStore: Send + Sync {
    /// Full overwrite of the interaction document (GM only).
    async fn put_interaction(&self, interaction: ActiveInteraction) -> StoreResult<()>;

    /// Full overwrite of the tally document (GM only: activation and reset).
    async fn put_tally(&self, tally: TallyState) -> StoreResult<()>;

    /// Apply a delta atomically with respect to every other writer.
    async fn apply_tally_delta(&self, delta: TallyDelta) -> StoreResult<()>;

    /// Subscribe to interaction snapshots. The receiver holds the current
    /// full document immediately and sees a new full snapshot after every
    /// write; subscribers replace mirrored state wholesale, never merge.
    fn watch_interaction(&self) -> watch::Receiver<ActiveInteraction>;

    /// Subscribe to tally snapshots, same contract as [`watch_interaction`].
    ///
    /// [`watch_interaction`]: TallyStore::watch_interaction
    fn watch_tally(&self) -> watch::Receiver<TallyState>;

    /// Current interaction snapshot.
    fn interaction(&self) -> ActiveInteraction {
        self.watch_interaction().borrow().clone()
    }

    /// Current tally snapshot.
    fn tally(&self) -> TallyState {
        self.watch_tally().borrow().clone()
    }
}

/// In-process store on top of watch channels.
///
/// Writes to one document are serialized by its sender, and `send_modify`
/// applies deltas under that same lock, so no voter ever races or observes a
/// half-applied update. Counts clamp at zero rather than going negative.
pub struct MemoryStore {
    interaction: watch::Sender<ActiveInteraction>,
    tally: watch::Sender<TallyState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            interaction: watch::Sender::new(ActiveInteraction::None),
            tally: watch::Sender::new(TallyState::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TallyStore for MemoryStore {
    async fn put_interaction(&self, interaction: ActiveInteraction) -> StoreResult<()> {
        self.interaction.send_replace(interaction);
        Ok(())
    }

    async fn put_tally(&self, tally: TallyState) -> StoreResult<()> {
        self.tally.send_replace(tally);
        Ok(())
    }

    async fn apply_tally_delta(&self, delta: TallyDelta) -> StoreResult<()> {
        self.tally.send_modify(|tally| {
            for (option_id, d) in &delta.counts {
                let count = tally.counts.entry(option_id.clone()).or_insert(0);
                *count = (*count as i64 + d).max(0) as u32;
            }
            tally.total_votes = (tally.total_votes as i64 + delta.total_votes).max(0) as u32;
        });
        Ok(())
    }

    fn watch_interaction(&self) -> watch::Receiver<ActiveInteraction> {
        self.interaction.subscribe()
    }

    fn watch_tally(&self) -> watch::Receiver<TallyState> {
        self.tally.subscribe()
    }
}
