use std::sync::Arc;

use chrono::{DateTime, Utc};

use learn_core::model::DeckId;
use learn_core::streak::{DeckStreakState, StreakChange, StreakTracker, StreakUpdate};
use learn_core::time::Clock;
use storage::DeckStreakRepository;

use crate::error::StreakServiceError;

/// Records completed sittings against a deck's stored streak.
#[derive(Clone)]
pub struct StreakService {
    clock: Clock,
    tracker: StreakTracker,
    streaks: Arc<dyn DeckStreakRepository>,
}

impl StreakService {
    #[must_use]
    pub fn new(clock: Clock, streaks: Arc<dyn DeckStreakRepository>) -> Self {
        Self {
            clock,
            tracker: StreakTracker::new(),
            streaks,
        }
    }

    #[must_use]
    pub fn with_tracker(mut self, tracker: StreakTracker) -> Self {
        self.tracker = tracker;
        self
    }

    #[must_use]
    pub fn tracker(&self) -> &StreakTracker {
        &self.tracker
    }

    /// Record a completed sitting now.
    ///
    /// # Errors
    ///
    /// Returns `StreakServiceError::Storage` if the streak cannot be loaded or saved.
    pub async fn record_study_session(
        &self,
        deck_id: DeckId,
    ) -> Result<StreakUpdate, StreakServiceError> {
        self.record_study_session_at(deck_id, self.clock.now()).await
    }

    /// Record a completed sitting at an explicit time.
    ///
    /// # Errors
    ///
    /// Returns `StreakServiceError::Storage` if the streak cannot be loaded or saved.
    pub async fn record_study_session_at(
        &self,
        deck_id: DeckId,
        now: DateTime<Utc>,
    ) -> Result<StreakUpdate, StreakServiceError> {
        let prior = self.streaks.get_streak(deck_id).await?;
        let update = self.tracker.record(&prior, now);
        self.streaks.save_streak(deck_id, &update.state).await?;

        match update.change {
            StreakChange::Reset if prior.current_streak > 1 => tracing::info!(
                %deck_id,
                lost = prior.current_streak,
                "study streak reset"
            ),
            _ => tracing::info!(
                %deck_id,
                streak = update.streak(),
                change = ?update.change,
                "study streak updated"
            ),
        }
        Ok(update)
    }

    /// # Errors
    ///
    /// Returns `StreakServiceError::Storage` if the streak cannot be loaded.
    pub async fn current(&self, deck_id: DeckId) -> Result<DeckStreakState, StreakServiceError> {
        Ok(self.streaks.get_streak(deck_id).await?)
    }
}
