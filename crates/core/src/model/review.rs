use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised while interpreting learner input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("recall quality must be between 1 and 4, got {0}")]
    InvalidQuality(i64),
}

//
// ─── RECALL QUALITY ───────────────────────────────────────────────────────────
//

/// Four-level recall signal supplied by the learner after revealing a card.
///
/// The numeric scale is fixed at 1..=4:
/// - `Again` (1): failed to recall
/// - `Hard` (2): recalled, but not well enough to count as a pass
/// - `Good` (3): recalled correctly
/// - `Easy` (4): recalled instantly
///
/// Values below `Good` count as a failed recall and reset the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RecallQuality {
    Again,
    Hard,
    Good,
    Easy,
}

impl RecallQuality {
    pub const ALL: [RecallQuality; 4] = [
        RecallQuality::Again,
        RecallQuality::Hard,
        RecallQuality::Good,
        RecallQuality::Easy,
    ];

    /// Converts a numeric quality (1-4) to a `RecallQuality`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidQuality` if the value is not in the range 1-4.
    pub fn from_u8(value: u8) -> Result<Self, ReviewError> {
        Self::try_from(i64::from(value))
    }

    /// The 1-4 value used by the ease-factor formula.
    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            RecallQuality::Again => 1,
            RecallQuality::Hard => 2,
            RecallQuality::Good => 3,
            RecallQuality::Easy => 4,
        }
    }

    /// Whether this response counts as a successful recall.
    #[must_use]
    pub fn is_pass(self) -> bool {
        self >= RecallQuality::Good
    }
}

impl TryFrom<i64> for RecallQuality {
    type Error = ReviewError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            _ => Err(ReviewError::InvalidQuality(value)),
        }
    }
}

impl TryFrom<u8> for RecallQuality {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value)
    }
}

impl From<RecallQuality> for u8 {
    fn from(quality: RecallQuality) -> Self {
        quality.value()
    }
}

impl fmt::Display for RecallQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecallQuality::Again => "again",
            RecallQuality::Hard => "hard",
            RecallQuality::Good => "good",
            RecallQuality::Easy => "easy",
        };
        f.write_str(label)
    }
}

//
// ─── CARD STATUS ──────────────────────────────────────────────────────────────
//

/// Learning status of a card, derived from the most recent recall quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardStatus {
    Learning,
    Review,
    Learned,
}

impl CardStatus {
    #[must_use]
    pub fn for_quality(quality: RecallQuality) -> Self {
        match quality {
            RecallQuality::Easy => CardStatus::Learned,
            RecallQuality::Good => CardStatus::Review,
            RecallQuality::Again | RecallQuality::Hard => CardStatus::Learning,
        }
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
