use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{SettingsError, StreakSettings};

/// Per-deck record of consecutive study days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStreakState {
    pub current_streak: u32,
    pub last_studied: Option<DateTime<Utc>>,
}

/// How a completed sitting affected the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// First sitting ever recorded for the deck.
    Started,
    /// Studied on the calendar day after the previous sitting.
    Continued,
    /// Studied again on the same calendar day.
    Unchanged,
    /// A day was missed, or `now` precedes the previous sitting.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub state: DeckStreakState,
    pub change: StreakChange,
}

impl StreakUpdate {
    #[must_use]
    pub fn streak(&self) -> u32 {
        self.state.current_streak
    }
}

/// Updates a deck's consecutive-day streak when a sitting completes.
///
/// Days are compared as calendar dates in a fixed UTC offset, so a sitting at
/// 23:59 and one at 00:01 are a day apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakTracker {
    offset: FixedOffset,
}

impl Default for StreakTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StreakTracker {
    /// Tracker that cuts days at midnight UTC.
    #[must_use]
    pub fn new() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    #[must_use]
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// # Errors
    ///
    /// Returns `SettingsError::InvalidUtcOffset` if the configured offset is out of range.
    pub fn from_settings(settings: &StreakSettings) -> Result<Self, SettingsError> {
        Ok(Self::with_offset(settings.offset()?))
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Whole calendar days from `earlier` to `later`; negative if `later` is on an earlier day.
    #[must_use]
    pub fn days_between(&self, earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
        let from = earlier.with_timezone(&self.offset).date_naive();
        let to = later.with_timezone(&self.offset).date_naive();
        (to - from).num_days()
    }

    /// Apply one completed sitting at `now` to the prior streak.
    #[must_use]
    pub fn record_study_session(
        &self,
        last_studied: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        prior_streak: u32,
    ) -> StreakUpdate {
        let (current_streak, change) = match last_studied {
            None => (1, StreakChange::Started),
            Some(last) => match self.days_between(last, now) {
                1 => (prior_streak.saturating_add(1), StreakChange::Continued),
                0 => (prior_streak, StreakChange::Unchanged),
                _ => (1, StreakChange::Reset),
            },
        };

        StreakUpdate {
            state: DeckStreakState {
                current_streak,
                last_studied: Some(now),
            },
            change,
        }
    }

    /// Convenience over [`StreakTracker::record_study_session`] for a stored state.
    #[must_use]
    pub fn record(&self, state: &DeckStreakState, now: DateTime<Utc>) -> StreakUpdate {
        self.record_study_session(state.last_studied, now, state.current_streak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::utc_date;
    use chrono::Duration;

    fn tracker() -> StreakTracker {
        StreakTracker::new()
    }

    #[test]
    fn first_sitting_starts_at_one() {
        let now = utc_date(2024, 5, 5);
        let update = tracker().record_study_session(None, now, 0);
        assert_eq!(update.streak(), 1);
        assert_eq!(update.change, StreakChange::Started);
        assert_eq!(update.state.last_studied, Some(now));
    }

    #[test]
    fn next_day_continues() {
        let update =
            tracker().record_study_session(Some(utc_date(2024, 1, 1)), utc_date(2024, 1, 2), 4);
        assert_eq!(update.streak(), 5);
        assert_eq!(update.change, StreakChange::Continued);
    }

    #[test]
    fn same_day_keeps_streak() {
        let morning = utc_date(2024, 1, 1) + Duration::hours(8);
        let evening = utc_date(2024, 1, 1) + Duration::hours(22);
        let update = tracker().record_study_session(Some(morning), evening, 3);
        assert_eq!(update.streak(), 3);
        assert_eq!(update.change, StreakChange::Unchanged);
        assert_eq!(update.state.last_studied, Some(evening));
    }

    #[test]
    fn gap_resets() {
        let update =
            tracker().record_study_session(Some(utc_date(2024, 1, 1)), utc_date(2024, 1, 4), 9);
        assert_eq!(update.streak(), 1);
        assert_eq!(update.change, StreakChange::Reset);
    }

    #[test]
    fn clock_skew_resets() {
        let update =
            tracker().record_study_session(Some(utc_date(2024, 1, 3)), utc_date(2024, 1, 2), 9);
        assert_eq!(update.streak(), 1);
        assert_eq!(update.change, StreakChange::Reset);
    }

    #[test]
    fn minutes_apart_across_midnight_is_one_day() {
        let late = utc_date(2024, 1, 1) + Duration::minutes(23 * 60 + 59);
        let early = utc_date(2024, 1, 2) + Duration::minutes(1);
        assert_eq!(tracker().days_between(late, early), 1);
        assert_eq!(tracker().record_study_session(Some(late), early, 2).streak(), 3);
    }

    #[test]
    fn offset_moves_day_boundary() {
        // 02:00Z and 22:00Z on Jan 2 UTC are Jan 1 and Jan 2 in UTC-05:00
        let first = utc_date(2024, 1, 2) + Duration::hours(2);
        let second = utc_date(2024, 1, 2) + Duration::hours(22);
        assert_eq!(tracker().days_between(first, second), 0);

        let settings = StreakSettings::new(-300).unwrap();
        let local = StreakTracker::from_settings(&settings).unwrap();
        assert_eq!(local.days_between(first, second), 1);
        assert_eq!(local.record_study_session(Some(first), second, 1).streak(), 2);
    }

    #[test]
    fn record_uses_stored_state() {
        let state = DeckStreakState {
            current_streak: 7,
            last_studied: Some(utc_date(2024, 2, 28)),
        };
        let update = tracker().record(&state, utc_date(2024, 2, 29));
        assert_eq!(update.streak(), 8);
    }

    #[test]
    fn streak_saturates() {
        let update = tracker().record_study_session(
            Some(utc_date(2024, 1, 1)),
            utc_date(2024, 1, 2),
            u32::MAX,
        );
        assert_eq!(update.streak(), u32::MAX);
    }
}
