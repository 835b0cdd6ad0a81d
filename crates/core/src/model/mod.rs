mod ids;
mod review;

pub use ids::{CardId, DeckId, ParseIdError};
pub use review::{CardStatus, RecallQuality, ReviewError};
