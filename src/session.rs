//! GM-side round lifecycle: Idle -> Open -> Closed -> Idle, or reopened back
//! to Open. The controller is the only writer of the interaction document
//! and the only actor allowed to overwrite the tally wholesale.

use std::collections::HashSet;
use std::sync::Arc;

use crate::store::{StoreError, TallyStore};
use crate::types::{now_ms, ActiveInteraction, OptionId, SessionId, TallyState, VoteOption, VoteRound};

/// Errors surfaced to the GM operator. Configuration problems are rejected
/// before any write; store failures carry the underlying error text so the
/// operator can retry manually.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("a round needs 2 or 3 options, got {0}")]
    OptionCount(usize),

    #[error("duplicate option id: {0}")]
    DuplicateOption(OptionId),

    #[error("another interaction is already active")]
    AlreadyActive,

    #[error("no voting round is active")]
    NoActiveRound,

    #[error("voting is not open")]
    NotOpen,

    #[error("voting is not closed")]
    NotClosed,

    /// The round was written but the tally initialization failed. The round
    /// is live with no tally behind it; recovery is a manual re-activation
    /// or reset, never an automatic rollback.
    #[error("round written but tally initialization failed: {0}")]
    PartialActivation(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The GM-operated actor that creates, opens, closes and resets rounds.
#[derive(Clone)]
pub struct SessionController {
    store: Arc<dyn TallyStore>,
}

impl SessionController {
    pub fn new(store: Arc<dyn TallyStore>) -> Self {
        Self { store }
    }

    fn current_round(&self) -> Result<VoteRound, SessionError> {
        match self.store.interaction() {
            ActiveInteraction::Vote(round) => Ok(round),
            ActiveInteraction::None => Err(SessionError::NoActiveRound),
        }
    }

    /// Open a fresh voting round under a new session id.
    ///
    /// Writes the round first and a zeroed tally second. A failure between
    /// the two leaves a round visible with no tally document behind it;
    /// that is reported as [`SessionError::PartialActivation`] and left for
    /// the operator to retry.
    pub async fn activate(
        &self,
        question: String,
        options: Vec<VoteOption>,
        timer_seconds: u32,
    ) -> Result<VoteRound, SessionError> {
        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        validate_options(&options)?;
        if !matches!(self.store.interaction(), ActiveInteraction::None) {
            return Err(SessionError::AlreadyActive);
        }

        let round = VoteRound {
            session_id: new_session_id(),
            question,
            options,
            is_open: true,
            started_at: now_ms(),
            timer_seconds,
        };
        self.store
            .put_interaction(ActiveInteraction::Vote(round.clone()))
            .await?;
        self.store
            .put_tally(TallyState::zeroed(&round.options))
            .await
            .map_err(SessionError::PartialActivation)?;
        Ok(round)
    }

    /// Stop accepting votes. Session id, countdown baseline and counts stay
    /// untouched so the frozen tallies remain visible for the reveal.
    pub async fn close(&self) -> Result<(), SessionError> {
        let mut round = self.current_round()?;
        if !round.is_open {
            return Err(SessionError::NotOpen);
        }
        round.is_open = false;
        self.store
            .put_interaction(ActiveInteraction::Vote(round))
            .await?;
        Ok(())
    }

    /// Reopen a closed round. The countdown restarts from scratch; it does
    /// not resume.
    pub async fn reopen(&self) -> Result<(), SessionError> {
        let mut round = self.current_round()?;
        if round.is_open {
            return Err(SessionError::NotClosed);
        }
        round.is_open = true;
        round.started_at = now_ms();
        self.store
            .put_interaction(ActiveInteraction::Vote(round))
            .await?;
        Ok(())
    }

    /// Invalidate everything cast so far: rotate the session id, restart the
    /// countdown, zero the tally. Old ballot receipts are orphaned by the
    /// rotation, so every client gets to vote again. "Reset" means everyone
    /// votes again, not undo.
    pub async fn reset_votes(&self) -> Result<VoteRound, SessionError> {
        let mut round = self.current_round()?;
        round.session_id = new_session_id();
        round.started_at = now_ms();
        self.store
            .put_interaction(ActiveInteraction::Vote(round.clone()))
            .await?;
        self.store
            .put_tally(TallyState::zeroed(&round.options))
            .await?;
        Ok(round)
    }

    /// End the interaction entirely. The tally document is left stale;
    /// nothing reads it while no vote session runs.
    pub async fn deactivate(&self) -> Result<(), SessionError> {
        self.store.put_interaction(ActiveInteraction::None).await?;
        Ok(())
    }
}

fn validate_options(options: &[VoteOption]) -> Result<(), SessionError> {
    if !(2..=3).contains(&options.len()) {
        return Err(SessionError::OptionCount(options.len()));
    }
    let mut seen = HashSet::new();
    for option in options {
        if !seen.insert(option.id.as_str()) {
            return Err(SessionError::DuplicateOption(option.id.clone()));
        }
    }
    Ok(())
}

fn new_session_id() -> SessionId {
    format!("vote-{}", ulid::Ulid::new())
}
