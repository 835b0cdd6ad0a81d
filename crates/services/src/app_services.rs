use std::sync::Arc;

use storage::Storage;

use crate::Clock;
use crate::config::StudyConfig;
use crate::error::ConfigError;
use crate::review_service::ReviewService;
use crate::sessions::StudyLoopService;
use crate::stats_service::StatsService;
use crate::streak_service::StreakService;

/// Assembles the study services over one storage backend and configuration.
#[derive(Clone)]
pub struct StudyServices {
    review: Arc<ReviewService>,
    streaks: Arc<StreakService>,
    study: Arc<StudyLoopService>,
    stats: Arc<StatsService>,
}

impl StudyServices {
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration does not validate.
    pub fn new(config: &StudyConfig, clock: Clock, storage: Storage) -> Result<Self, ConfigError> {
        config.validate()?;
        let scheduler = config.scheduler();
        let tracker = config.streak_tracker()?;

        let streaks = StreakService::new(clock, Arc::clone(&storage.streaks)).with_tracker(tracker);
        let review = ReviewService::new(Arc::clone(&storage.memory))
            .with_clock(clock)
            .with_scheduler(scheduler);
        let study = StudyLoopService::new(clock, Arc::clone(&storage.memory), streaks.clone())
            .with_scheduler(scheduler);
        let stats = StatsService::new(clock, Arc::clone(&storage.activity))
            .with_settings(config.stats)
            .with_offset(tracker.offset());

        tracing::debug!(
            fixed_clock = clock.is_fixed(),
            "study services assembled"
        );

        Ok(Self {
            review: Arc::new(review),
            streaks: Arc::new(streaks),
            study: Arc::new(study),
            stats: Arc::new(stats),
        })
    }

    /// Default configuration over in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the default configuration does not validate.
    pub fn in_memory(clock: Clock) -> Result<Self, ConfigError> {
        Self::new(&StudyConfig::default(), clock, Storage::in_memory())
    }

    #[must_use]
    pub fn review(&self) -> Arc<ReviewService> {
        Arc::clone(&self.review)
    }

    #[must_use]
    pub fn streaks(&self) -> Arc<StreakService> {
        Arc::clone(&self.streaks)
    }

    #[must_use]
    pub fn study(&self) -> Arc<StudyLoopService> {
        Arc::clone(&self.study)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }
}
