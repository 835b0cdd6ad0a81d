use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest ease factor a card may ever carry.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor assumed for a card that has never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Interval (in days) assumed for a card that has never been reviewed.
pub const DEFAULT_INTERVAL_DAYS: u32 = 1;

const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("initial ease factor must be finite and at least {MIN_EASE_FACTOR}, got {provided}")]
    InvalidInitialEaseFactor { provided: f64 },

    #[error("initial interval must be at least 1 day")]
    InvalidInitialInterval,

    #[error("UTC offset must be strictly within ±24h, got {provided} minutes")]
    InvalidUtcOffset { provided: i32 },
}

//
// ─── SCHEDULER SETTINGS ────────────────────────────────────────────────────────
//

/// How the repetition counter reacts to a failed recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepetitionPolicy {
    /// Count every scheduling call, including failed recalls.
    #[default]
    AlwaysIncrement,
    /// Classic SM-2: a failed recall resets the counter to zero.
    ResetOnLapse,
}

/// Tunables for the review scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerSettings {
    initial_ease_factor: f64,
    initial_interval_days: u32,
    repetition_policy: RepetitionPolicy,
}

impl SchedulerSettings {
    /// Creates validated scheduler settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInitialEaseFactor` if the ease factor is non-finite or below
    /// the floor, and `InvalidInitialInterval` if the interval is zero.
    pub fn new(
        initial_ease_factor: f64,
        initial_interval_days: u32,
        repetition_policy: RepetitionPolicy,
    ) -> Result<Self, SettingsError> {
        let settings = Self {
            initial_ease_factor,
            initial_interval_days,
            repetition_policy,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Re-checks invariants, used after deserializing.
    ///
    /// # Errors
    ///
    /// See [`SchedulerSettings::new`].
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.initial_ease_factor.is_finite() || self.initial_ease_factor < MIN_EASE_FACTOR {
            return Err(SettingsError::InvalidInitialEaseFactor {
                provided: self.initial_ease_factor,
            });
        }
        if self.initial_interval_days == 0 {
            return Err(SettingsError::InvalidInitialInterval);
        }
        Ok(())
    }

    #[must_use]
    pub fn with_repetition_policy(mut self, policy: RepetitionPolicy) -> Self {
        self.repetition_policy = policy;
        self
    }

    #[must_use]
    pub fn initial_ease_factor(&self) -> f64 {
        self.initial_ease_factor
    }

    #[must_use]
    pub fn initial_interval_days(&self) -> u32 {
        self.initial_interval_days
    }

    #[must_use]
    pub fn repetition_policy(&self) -> RepetitionPolicy {
        self.repetition_policy
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            initial_ease_factor: DEFAULT_EASE_FACTOR,
            initial_interval_days: DEFAULT_INTERVAL_DAYS,
            repetition_policy: RepetitionPolicy::default(),
        }
    }
}

//
// ─── STREAK SETTINGS ───────────────────────────────────────────────────────────
//

/// Where the learner's calendar day begins, expressed as a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreakSettings {
    utc_offset_minutes: i32,
}

impl StreakSettings {
    /// # Errors
    ///
    /// Returns `InvalidUtcOffset` if the offset is a full day or more.
    pub fn new(utc_offset_minutes: i32) -> Result<Self, SettingsError> {
        let settings = Self { utc_offset_minutes };
        settings.offset()?;
        Ok(settings)
    }

    #[must_use]
    pub fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }

    /// The offset used to cut timestamps into calendar days.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUtcOffset` if the stored minutes are out of range.
    pub fn offset(&self) -> Result<FixedOffset, SettingsError> {
        let invalid = SettingsError::InvalidUtcOffset {
            provided: self.utc_offset_minutes,
        };
        if self.utc_offset_minutes.abs() >= MAX_UTC_OFFSET_MINUTES {
            return Err(invalid);
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scheduler_settings_are_valid() {
        let settings = SchedulerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.initial_ease_factor(), DEFAULT_EASE_FACTOR);
        assert_eq!(settings.initial_interval_days(), 1);
        assert_eq!(settings.repetition_policy(), RepetitionPolicy::AlwaysIncrement);
    }

    #[test]
    fn scheduler_settings_reject_bad_values() {
        assert!(matches!(
            SchedulerSettings::new(1.2, 1, RepetitionPolicy::AlwaysIncrement),
            Err(SettingsError::InvalidInitialEaseFactor { .. })
        ));
        assert!(matches!(
            SchedulerSettings::new(f64::NAN, 1, RepetitionPolicy::AlwaysIncrement),
            Err(SettingsError::InvalidInitialEaseFactor { .. })
        ));
        assert_eq!(
            SchedulerSettings::new(2.5, 0, RepetitionPolicy::ResetOnLapse),
            Err(SettingsError::InvalidInitialInterval)
        );
    }

    #[test]
    fn streak_offset_bounds() {
        assert_eq!(
            StreakSettings::new(-300).unwrap().offset().unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap()
        );
        assert_eq!(
            StreakSettings::new(24 * 60),
            Err(SettingsError::InvalidUtcOffset { provided: 1440 })
        );
    }
}
