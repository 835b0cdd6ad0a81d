//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::ErrorKind;
use learn_core::config::SettingsError;
use learn_core::scheduler::SchedulerError;
use learn_core::session::SessionError;
use storage::StorageError;

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StreakService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StreakServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudyLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Streak(#[from] StreakServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("session is not complete")]
    NotComplete,
}

impl StudyServiceError {
    /// The core error kind, when the failure is a caller contract violation.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            StudyServiceError::Session(err) => Some(err.kind()),
            StudyServiceError::NotComplete => Some(ErrorKind::InvalidState),
            StudyServiceError::Streak(_) | StudyServiceError::Storage(_) => None,
        }
    }
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error("reporting window does not fit the calendar")]
    DateOutOfRange,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading `StudyConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("stats windows must be at least 1 day")]
    InvalidStatsWindow,
}
