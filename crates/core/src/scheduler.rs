use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{MIN_EASE_FACTOR, RepetitionPolicy, SchedulerSettings};
use crate::error::ErrorKind;
use crate::model::{CardStatus, RecallQuality, ReviewError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    #[error(transparent)]
    Quality(#[from] ReviewError),
    #[error("ease factor must be finite and at least {MIN_EASE_FACTOR}, got {provided}")]
    InvalidEaseFactor { provided: f64 },
    #[error("interval must be at least 1 day")]
    InvalidInterval,
    #[error("next review date is out of range ({interval_days} days after {from})")]
    DateOutOfRange {
        from: DateTime<Utc>,
        interval_days: u64,
    },
}

impl SchedulerError {
    /// Every scheduler failure is a caller contract violation on its inputs.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

//
// ─── MEMORY STATE ──────────────────────────────────────────────────────────────
//

/// Per-card, per-learner memory strength.
///
/// Store this with each flashcard; it is created on the first review and
/// replaced by the scheduler on every later one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardMemoryState {
    pub status: CardStatus,
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl CardMemoryState {
    /// Whether the card should be shown at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}

//
// ─── SCHEDULE OUTCOME ──────────────────────────────────────────────────────────
//

/// Result of one application of the update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleOutcome {
    pub ease_factor: f64,
    pub interval: u32,
    pub next_review: DateTime<Utc>,
}

/// Outcomes for each possible response, used to label rating buttons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulePreview {
    pub again: ScheduleOutcome,
    pub hard: ScheduleOutcome,
    pub good: ScheduleOutcome,
    pub easy: ScheduleOutcome,
}

impl SchedulePreview {
    #[must_use]
    pub fn select(&self, quality: RecallQuality) -> &ScheduleOutcome {
        match quality {
            RecallQuality::Again => &self.again,
            RecallQuality::Hard => &self.hard,
            RecallQuality::Good => &self.good,
            RecallQuality::Easy => &self.easy,
        }
    }
}

/// Applies the SM-2 style update to a card's ease factor and interval.
///
/// `now` is supplied by the caller; the next review lands `interval` calendar
/// days after it.
///
/// # Errors
///
/// - `InvalidEaseFactor` if `prior_ease_factor` is non-finite or below 1.3
/// - `InvalidInterval` if `prior_interval` is zero
/// - `DateOutOfRange` if the next review date cannot be represented
///
/// # Examples
///
/// ```
/// # use learn_core::scheduler::schedule;
/// # use learn_core::model::RecallQuality;
/// # use chrono::{TimeZone, Utc};
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let outcome = schedule(2.5, 1, RecallQuality::Easy, now)?;
/// assert_eq!(outcome.interval, 6);
/// assert_eq!(outcome.next_review, Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap());
/// # Ok::<(), learn_core::scheduler::SchedulerError>(())
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn schedule(
    prior_ease_factor: f64,
    prior_interval: u32,
    quality: RecallQuality,
    now: DateTime<Utc>,
) -> Result<ScheduleOutcome, SchedulerError> {
    if !prior_ease_factor.is_finite() || prior_ease_factor < MIN_EASE_FACTOR {
        return Err(SchedulerError::InvalidEaseFactor {
            provided: prior_ease_factor,
        });
    }
    if prior_interval == 0 {
        return Err(SchedulerError::InvalidInterval);
    }

    let ease_factor = next_ease_factor(prior_ease_factor, quality);

    let interval = if !quality.is_pass() {
        1
    } else if prior_interval == 1 {
        6
    } else {
        // f64::round breaks ties away from zero
        let scaled = (f64::from(prior_interval) * ease_factor).round();
        if scaled > f64::from(u32::MAX) {
            return Err(SchedulerError::DateOutOfRange {
                from: now,
                interval_days: scaled as u64,
            });
        }
        scaled as u32
    };

    let next_review = now
        .checked_add_days(Days::new(u64::from(interval)))
        .ok_or(SchedulerError::DateOutOfRange {
            from: now,
            interval_days: u64::from(interval),
        })?;

    Ok(ScheduleOutcome {
        ease_factor,
        interval,
        next_review,
    })
}

/// [`schedule`] for callers holding the learner's raw 1-4 rating.
///
/// # Errors
///
/// Returns `SchedulerError::Quality` for ratings outside 1-4, otherwise the
/// errors of [`schedule`].
pub fn schedule_raw(
    prior_ease_factor: f64,
    prior_interval: u32,
    quality: i64,
    now: DateTime<Utc>,
) -> Result<ScheduleOutcome, SchedulerError> {
    let quality = RecallQuality::try_from(quality)?;
    schedule(prior_ease_factor, prior_interval, quality, now)
}

fn next_ease_factor(prior: f64, quality: RecallQuality) -> f64 {
    let distance = 5.0 - f64::from(quality.value());
    let delta = 0.1 - distance * (0.08 + distance * 0.02);
    (prior + delta).max(MIN_EASE_FACTOR)
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Deterministic review scheduler.
///
/// Wraps [`schedule`] with first-review defaults, status derivation and the
/// repetition counter, producing the full `CardMemoryState` to persist.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scheduler {
    settings: SchedulerSettings,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: SchedulerSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Ease factor and interval to start from for a possibly-new card.
    fn prior_parameters(&self, prior: Option<&CardMemoryState>) -> (f64, u32, u32) {
        match prior {
            Some(state) => (state.ease_factor, state.interval, state.repetitions),
            None => (
                self.settings.initial_ease_factor(),
                self.settings.initial_interval_days(),
                0,
            ),
        }
    }

    /// Apply a learner's response and return the card's next memory state.
    ///
    /// Pass `None` for a card that has never been reviewed.
    ///
    /// # Errors
    ///
    /// Propagates the input errors of [`schedule`].
    pub fn review(
        &self,
        prior: Option<&CardMemoryState>,
        quality: RecallQuality,
        now: DateTime<Utc>,
    ) -> Result<CardMemoryState, SchedulerError> {
        let (ease_factor, interval, repetitions) = self.prior_parameters(prior);
        let outcome = schedule(ease_factor, interval, quality, now)?;

        let repetitions = match self.settings.repetition_policy() {
            RepetitionPolicy::AlwaysIncrement => repetitions.saturating_add(1),
            RepetitionPolicy::ResetOnLapse if quality.is_pass() => repetitions.saturating_add(1),
            RepetitionPolicy::ResetOnLapse => 0,
        };

        Ok(CardMemoryState {
            status: CardStatus::for_quality(quality),
            ease_factor: outcome.ease_factor,
            interval: outcome.interval,
            repetitions,
            next_review: outcome.next_review,
            last_reviewed: Some(now),
        })
    }

    /// Outcomes for all four responses without committing to one.
    ///
    /// # Errors
    ///
    /// Propagates the input errors of [`schedule`].
    pub fn preview(
        &self,
        prior: Option<&CardMemoryState>,
        now: DateTime<Utc>,
    ) -> Result<SchedulePreview, SchedulerError> {
        let (ease_factor, interval, _) = self.prior_parameters(prior);
        Ok(SchedulePreview {
            again: schedule(ease_factor, interval, RecallQuality::Again, now)?,
            hard: schedule(ease_factor, interval, RecallQuality::Hard, now)?,
            good: schedule(ease_factor, interval, RecallQuality::Good, now)?,
            easy: schedule(ease_factor, interval, RecallQuality::Easy, now)?,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
