use std::sync::Arc;

use chrono::{DateTime, Utc};

use learn_core::{
    model::{CardId, RecallQuality},
    scheduler::{CardMemoryState, SchedulePreview, Scheduler},
    time::Clock,
};
use storage::MemoryStateRepository;

use crate::error::ReviewServiceError;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Applies a learner's rating to a single card outside of a sitting.
///
/// Loads the card's memory state, schedules it and upserts the result, one
/// record per card.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    scheduler: Scheduler,
    memory: Arc<dyn MemoryStateRepository>,
}

impl ReviewService {
    #[must_use]
    pub fn new(memory: Arc<dyn MemoryStateRepository>) -> Self {
        Self {
            clock: Clock::default(),
            scheduler: Scheduler::new(),
            memory,
        }
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Rate a card at the service clock's current time.
    ///
    /// # Errors
    ///
    /// Returns scheduler errors for an invalid stored state and storage errors
    /// if the state cannot be loaded or saved.
    pub async fn review_card(
        &self,
        card_id: CardId,
        quality: RecallQuality,
    ) -> Result<CardMemoryState, ReviewServiceError> {
        self.review_card_at(card_id, quality, self.now()).await
    }

    /// Rate a card at an explicit time.
    ///
    /// # Errors
    ///
    /// See [`ReviewService::review_card`].
    pub async fn review_card_at(
        &self,
        card_id: CardId,
        quality: RecallQuality,
        reviewed_at: DateTime<Utc>,
    ) -> Result<CardMemoryState, ReviewServiceError> {
        let prior = self.memory.get_memory_state(card_id).await?;
        let state = self
            .scheduler
            .review(prior.as_ref(), quality, reviewed_at)?;

        self.memory.upsert_memory_state(card_id, &state).await?;

        tracing::debug!(
            %card_id,
            %quality,
            interval = state.interval,
            ease_factor = state.ease_factor,
            repetitions = state.repetitions,
            "card reviewed"
        );
        Ok(state)
    }

    /// Intervals each rating would produce for a card right now.
    ///
    /// # Errors
    ///
    /// Returns scheduler or storage errors as for [`ReviewService::review_card`].
    pub async fn preview_card(
        &self,
        card_id: CardId,
    ) -> Result<SchedulePreview, ReviewServiceError> {
        let prior = self.memory.get_memory_state(card_id).await?;
        Ok(self.scheduler.preview(prior.as_ref(), self.now())?)
    }

    /// Drop a card's memory state along with the card.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the delete fails.
    pub async fn forget_card(&self, card_id: CardId) -> Result<(), ReviewServiceError> {
        self.memory.delete_memory_state(card_id).await?;
        tracing::debug!(%card_id, "memory state removed");
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
