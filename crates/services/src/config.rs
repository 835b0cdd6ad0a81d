//! TOML-backed configuration for the study services.

use std::path::Path;

use serde::{Deserialize, Serialize};

use learn_core::config::{SchedulerSettings, StreakSettings};
use learn_core::scheduler::Scheduler;
use learn_core::streak::StreakTracker;

use crate::error::ConfigError;

/// Reporting windows for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatsSettings {
    /// Days counted by "recent activity".
    pub recent_activity_days: u32,
    /// Furthest back the activity streak looks.
    pub activity_lookback_days: u32,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            recent_activity_days: 7,
            activity_lookback_days: 30,
        }
    }
}

/// Top-level configuration, every section optional.
///
/// ```toml
/// [scheduler]
/// initial_ease_factor = 2.5
/// initial_interval_days = 1
/// repetition_policy = "always_increment"
///
/// [streak]
/// utc_offset_minutes = -300
///
/// [stats]
/// recent_activity_days = 7
/// activity_lookback_days = 30
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    pub scheduler: SchedulerSettings,
    pub streak: StreakSettings,
    pub stats: StatsSettings,
}

impl StudyConfig {
    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML or unknown keys, and a
    /// validation error if any value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`StudyConfig::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded study config");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;
        self.streak.offset()?;
        if self.stats.recent_activity_days == 0 || self.stats.activity_lookback_days == 0 {
            return Err(ConfigError::InvalidStatsWindow);
        }
        Ok(())
    }

    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::with_settings(self.scheduler)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Settings` if the UTC offset is out of range.
    pub fn streak_tracker(&self) -> Result<StreakTracker, ConfigError> {
        Ok(StreakTracker::from_settings(&self.streak)?)
    }
}
