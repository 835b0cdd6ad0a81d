//! Dashboard aggregates computed through the activity port.

use std::sync::Arc;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

use learn_core::time::Clock;
use storage::{ReviewActivityRepository, StatusCounts};

use crate::config::StatsSettings;
use crate::error::StatsError;

/// Snapshot shown on the learner's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub status: StatusCounts,
    pub recent_activity: u32,
    pub activity_streak: u32,
}

#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    offset: FixedOffset,
    settings: StatsSettings,
    activity: Arc<dyn ReviewActivityRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(clock: Clock, activity: Arc<dyn ReviewActivityRepository>) -> Self {
        Self {
            clock,
            offset: Utc.fix(),
            settings: StatsSettings::default(),
            activity,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: StatsSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Day boundaries for the per-day scan, normally the streak tracker's offset.
    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the counts cannot be read.
    pub async fn status_breakdown(&self) -> Result<StatusCounts, StatsError> {
        Ok(self.activity.status_counts().await?)
    }

    /// Cards reviewed within the last `recent_activity_days`.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::DateOutOfRange` if the window start underflows, or storage errors.
    pub async fn recent_activity(&self) -> Result<u32, StatsError> {
        let since = self
            .clock
            .now()
            .checked_sub_days(Days::new(u64::from(self.settings.recent_activity_days)))
            .ok_or(StatsError::DateOutOfRange)?;
        Ok(self.activity.count_reviewed_since(since).await?)
    }

    /// Consecutive days, ending today, with at least one review.
    ///
    /// Scans one calendar day at a time and stops at the first empty day or
    /// after `activity_lookback_days`.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::DateOutOfRange` if a day boundary cannot be built, or storage errors.
    pub async fn activity_streak(&self) -> Result<u32, StatsError> {
        let today = self.clock.now().with_timezone(&self.offset).date_naive();
        let mut streak = 0;

        for back in 0..self.settings.activity_lookback_days {
            let day = today
                .checked_sub_days(Days::new(u64::from(back)))
                .ok_or(StatsError::DateOutOfRange)?;
            let start = self.day_start(day)?;
            let end = self.day_start(day.succ_opt().ok_or(StatsError::DateOutOfRange)?)?;

            if self.activity.count_reviewed_between(start, end).await? == 0 {
                break;
            }
            streak += 1;
        }

        tracing::debug!(streak, "activity streak computed");
        Ok(streak)
    }

    /// # Errors
    ///
    /// Propagates the errors of the individual aggregates.
    pub async fn dashboard(&self) -> Result<DashboardStats, StatsError> {
        Ok(DashboardStats {
            status: self.status_breakdown().await?,
            recent_activity: self.recent_activity().await?,
            activity_streak: self.activity_streak().await?,
        })
    }

    fn day_start(&self, day: NaiveDate) -> Result<DateTime<Utc>, StatsError> {
        day.and_time(NaiveTime::MIN)
            .and_local_timezone(self.offset)
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or(StatsError::DateOutOfRange)
    }
}
