use thiserror::Error;

use crate::config::SettingsError;
use crate::model::ReviewError;
use crate::scheduler::SchedulerError;
use crate::session::SessionError;

/// The two ways a caller can misuse the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Out-of-range or malformed input such as a quality outside 1-4.
    InvalidInput,
    /// An operation issued from a state that forbids it.
    InvalidState,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Review(_) | Error::Settings(_) => ErrorKind::InvalidInput,
            Error::Scheduler(err) => err.kind(),
            Error::Session(err) => err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecallQuality;
    use crate::session::{SessionOperation, SessionPhase};

    #[test]
    fn kinds_are_preserved_through_conversion() {
        let quality: Error = RecallQuality::from_u8(7).unwrap_err().into();
        assert_eq!(quality.kind(), ErrorKind::InvalidInput);

        let state: Error = SessionError::InvalidState {
            operation: SessionOperation::Skip,
            phase: SessionPhase::AwaitingReveal,
        }
        .into();
        assert_eq!(state.kind(), ErrorKind::InvalidState);
        assert_eq!(
            state.to_string(),
            "cannot skip while the session is awaiting reveal"
        );
    }
}
