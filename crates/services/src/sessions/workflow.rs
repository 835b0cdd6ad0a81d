use std::sync::Arc;

use learn_core::model::{CardId, DeckId, RecallQuality};
use learn_core::scheduler::Scheduler;
use learn_core::session::{SessionCard, SessionError, SessionStep, StudySession};
use learn_core::streak::StreakUpdate;
use storage::MemoryStateRepository;

use crate::Clock;
use crate::error::StudyServiceError;
use crate::streak_service::StreakService;

/// Result of rating or skipping the current card in a sitting.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyAnswer {
    pub step: SessionStep,
    /// Set on the step that finished the sitting.
    pub streak: Option<StreakUpdate>,
}

/// Runs sittings against storage: loads memory states up front, persists each
/// rating before the session advances, and records the deck streak on finish.
#[derive(Clone)]
pub struct StudyLoopService {
    clock: Clock,
    scheduler: Scheduler,
    memory: Arc<dyn MemoryStateRepository>,
    streaks: StreakService,
}

impl StudyLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        memory: Arc<dyn MemoryStateRepository>,
        streaks: StreakService,
    ) -> Self {
        Self {
            clock,
            scheduler: Scheduler::new(),
            memory,
            streaks,
        }
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Start a sitting over `card_ids` in the given order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty list and storage errors if
    /// memory states cannot be loaded.
    pub async fn start_session(
        &self,
        deck_id: DeckId,
        card_ids: &[CardId],
    ) -> Result<StudySession, StudyServiceError> {
        if card_ids.is_empty() {
            tracing::warn!(%deck_id, "refusing to start an empty session");
            return Err(SessionError::Empty.into());
        }

        let states = self.memory.get_memory_states(card_ids).await?;
        let cards = card_ids
            .iter()
            .zip(states)
            .map(|(id, memory)| SessionCard::new(*id, memory))
            .collect();
        let session = StudySession::new(deck_id, cards)?;

        tracing::debug!(%deck_id, cards = card_ids.len(), "study session started");
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once the session is complete.
    pub fn reveal(&self, session: &mut StudySession) -> Result<(), StudyServiceError> {
        session.reveal().map_err(|err| self.rejected(session, err))?;
        tracing::debug!(
            deck_id = %session.deck_id(),
            index = session.view().index,
            "answer revealed"
        );
        Ok(())
    }

    /// Rate the current card, persist its new state, then advance.
    ///
    /// If the store rejects the write the session does not move, so the same
    /// answer can be retried.
    ///
    /// # Errors
    ///
    /// Returns session errors for an out-of-order call, storage errors if the
    /// state cannot be saved, and streak errors if the finishing step could
    /// not record the streak. In the last case the step has already been
    /// taken; [`StudyLoopService::record_completion`] retries the streak.
    pub async fn answer_current(
        &self,
        session: &mut StudySession,
        quality: RecallQuality,
    ) -> Result<StudyAnswer, StudyServiceError> {
        let now = self.clock.now();
        let (card_id, state) = session
            .preview_response(&self.scheduler, quality, now)
            .map_err(|err| self.rejected(session, err))?;

        if let Err(err) = self.memory.upsert_memory_state(card_id, &state).await {
            tracing::warn!(%card_id, error = %err, "failed to persist review; session not advanced");
            return Err(err.into());
        }

        let step = session.respond(&self.scheduler, quality, now)?;
        tracing::debug!(
            %card_id,
            %quality,
            interval = state.interval,
            ease_factor = state.ease_factor,
            "session card rated"
        );
        self.finish_step(session, step).await
    }

    /// Move past the current card without rating it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the answer is revealed, and
    /// streak errors as for [`StudyLoopService::answer_current`].
    pub async fn skip(&self, session: &mut StudySession) -> Result<StudyAnswer, StudyServiceError> {
        let step = session.skip().map_err(|err| self.rejected(session, err))?;
        tracing::debug!(card_id = %step.card_id, "session card skipped");
        self.finish_step(session, step).await
    }

    /// Run a finished sitting again over the same cards.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is complete.
    pub fn restart(&self, session: &mut StudySession) -> Result<(), StudyServiceError> {
        session.restart().map_err(|err| self.rejected(session, err))?;
        tracing::debug!(deck_id = %session.deck_id(), "study session restarted");
        Ok(())
    }

    /// Record the streak for a finished sitting.
    ///
    /// Recording twice on the same day leaves the streak unchanged, so this is
    /// safe to call after a failed attempt.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::NotComplete` for a sitting still in
    /// progress, or streak storage errors.
    pub async fn record_completion(
        &self,
        session: &StudySession,
    ) -> Result<StreakUpdate, StudyServiceError> {
        if !session.is_complete() {
            return Err(StudyServiceError::NotComplete);
        }
        let update = self
            .streaks
            .record_study_session_at(session.deck_id(), self.clock.now())
            .await?;
        tracing::info!(
            deck_id = %session.deck_id(),
            completed = session.view().completed,
            streak = update.streak(),
            "study session complete"
        );
        Ok(update)
    }

    async fn finish_step(
        &self,
        session: &StudySession,
        step: SessionStep,
    ) -> Result<StudyAnswer, StudyServiceError> {
        let streak = if step.finished {
            Some(self.record_completion(session).await?)
        } else {
            None
        };
        Ok(StudyAnswer { step, streak })
    }

    fn rejected(&self, session: &StudySession, err: SessionError) -> StudyServiceError {
        tracing::warn!(deck_id = %session.deck_id(), error = %err, "session operation rejected");
        err.into()
    }
}
