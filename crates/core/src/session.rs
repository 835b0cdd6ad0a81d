use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::model::{CardId, DeckId, RecallQuality};
use crate::scheduler::{CardMemoryState, Scheduler, SchedulerError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no cards available for session")]
    Empty,
    #[error("cannot {operation} while the session is {phase}")]
    InvalidState {
        operation: SessionOperation,
        phase: SessionPhase,
    },
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl SessionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Empty => ErrorKind::InvalidInput,
            SessionError::InvalidState { .. } => ErrorKind::InvalidState,
            SessionError::Scheduler(err) => err.kind(),
        }
    }
}

/// Learner actions that drive a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOperation {
    Reveal,
    Respond,
    Skip,
    Restart,
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionOperation::Reveal => "reveal",
            SessionOperation::Respond => "respond",
            SessionOperation::Skip => "skip",
            SessionOperation::Restart => "restart",
        })
    }
}

/// Where a sitting currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingReveal,
    AnswerRevealed,
    Complete,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::AwaitingReveal => "awaiting reveal",
            SessionPhase::AnswerRevealed => "showing the answer",
            SessionPhase::Complete => "complete",
        })
    }
}

//
// ─── CARDS & STEPS ─────────────────────────────────────────────────────────────
//

/// A card queued for the sitting with its memory state, if it has one yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCard {
    pub card_id: CardId,
    pub memory: Option<CardMemoryState>,
}

impl SessionCard {
    #[must_use]
    pub fn new(card_id: CardId, memory: Option<CardMemoryState>) -> Self {
        Self { card_id, memory }
    }
}

/// What happened when the session advanced past a card.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStep {
    pub card_id: CardId,
    /// New memory state when the card was rated; `None` when skipped.
    pub review: Option<CardMemoryState>,
    /// True when this step moved the session to `Complete`.
    pub finished: bool,
}

/// Read-only snapshot for rendering a sitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionView {
    pub current_card_id: Option<CardId>,
    pub revealed: bool,
    pub index: usize,
    pub total: usize,
    pub completed: usize,
    pub complete: bool,
}

impl SessionView {
    /// Progress through the sitting, counting a revealed answer as half a card.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        let half = if self.revealed { 0.5 } else { 0.0 };
        (self.index as f64 + half) / self.total as f64 * 100.0
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.index)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One sitting over a fixed, ordered list of cards.
///
/// Each card is shown once: reveal, then rate or skip. The order never
/// changes, including across [`StudySession::restart`]. A session belongs to
/// exactly one sitting and is intentionally not `Clone`.
pub struct StudySession {
    deck_id: DeckId,
    cards: Vec<SessionCard>,
    index: usize,
    phase: SessionPhase,
    completed: usize,
}

impl StudySession {
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `cards` is empty.
    pub fn new(deck_id: DeckId, cards: Vec<SessionCard>) -> Result<Self, SessionError> {
        if cards.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            deck_id,
            cards,
            index: 0,
            phase: SessionPhase::AwaitingReveal,
            completed: 0,
        })
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    #[must_use]
    pub fn cards(&self) -> &[SessionCard] {
        &self.cards
    }

    pub fn card_ids(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().map(|card| card.card_id)
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&SessionCard> {
        if self.is_complete() {
            return None;
        }
        self.cards.get(self.index)
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            current_card_id: self.current_card().map(|card| card.card_id),
            revealed: self.phase == SessionPhase::AnswerRevealed,
            index: self.index,
            total: self.cards.len(),
            completed: self.completed,
            complete: self.is_complete(),
        }
    }

    /// Show the back of the current card. Repeating it has no further effect.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once the session is complete.
    pub fn reveal(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::AwaitingReveal => {
                self.phase = SessionPhase::AnswerRevealed;
                Ok(())
            }
            SessionPhase::AnswerRevealed => Ok(()),
            SessionPhase::Complete => Err(self.invalid(SessionOperation::Reveal)),
        }
    }

    /// The memory state `respond` would store, without advancing.
    ///
    /// Lets a caller persist the result before committing the step.
    ///
    /// # Errors
    ///
    /// Same as [`StudySession::respond`].
    pub fn preview_response(
        &self,
        scheduler: &Scheduler,
        quality: RecallQuality,
        now: DateTime<Utc>,
    ) -> Result<(CardId, CardMemoryState), SessionError> {
        let card = self.revealed_card(SessionOperation::Respond)?;
        let state = scheduler.review(card.memory.as_ref(), quality, now)?;
        Ok((card.card_id, state))
    }

    /// Rate the current card, update its memory state and advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the answer is revealed, and
    /// `SessionError::Scheduler` if the card's stored state is rejected. The
    /// session is unchanged on error.
    pub fn respond(
        &mut self,
        scheduler: &Scheduler,
        quality: RecallQuality,
        now: DateTime<Utc>,
    ) -> Result<SessionStep, SessionError> {
        let (card_id, state) = self.preview_response(scheduler, quality, now)?;

        if let Some(card) = self.cards.get_mut(self.index) {
            card.memory = Some(state.clone());
        }
        self.completed += 1;
        let finished = self.advance();

        Ok(SessionStep {
            card_id,
            review: Some(state),
            finished,
        })
    }

    /// Move past the current card without rating it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the answer is revealed.
    pub fn skip(&mut self) -> Result<SessionStep, SessionError> {
        let card_id = self.revealed_card(SessionOperation::Skip)?.card_id;
        let finished = self.advance();
        Ok(SessionStep {
            card_id,
            review: None,
            finished,
        })
    }

    /// Run the same list again from the first card.
    ///
    /// Memory states updated during the previous run are kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is complete.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if !self.is_complete() {
            return Err(self.invalid(SessionOperation::Restart));
        }
        self.index = 0;
        self.completed = 0;
        self.phase = SessionPhase::AwaitingReveal;
        Ok(())
    }

    fn revealed_card(&self, operation: SessionOperation) -> Result<&SessionCard, SessionError> {
        if self.phase != SessionPhase::AnswerRevealed {
            return Err(self.invalid(operation));
        }
        self.cards
            .get(self.index)
            .ok_or_else(|| self.invalid(operation))
    }

    fn advance(&mut self) -> bool {
        self.index += 1;
        if self.index >= self.cards.len() {
            self.phase = SessionPhase::Complete;
            true
        } else {
            self.phase = SessionPhase::AwaitingReveal;
            false
        }
    }

    fn invalid(&self, operation: SessionOperation) -> SessionError {
        SessionError::InvalidState {
            operation,
            phase: self.phase,
        }
    }
}

impl fmt::Debug for StudySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("deck_id", &self.deck_id)
            .field("cards_len", &self.cards.len())
            .field("index", &self.index)
            .field("phase", &self.phase)
            .field("completed", &self.completed)
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CardStatus;
    use crate::time::{fixed_now, utc_date};

    fn session(n: u64) -> StudySession {
        let cards = (1..=n).map(|id| SessionCard::new(CardId::new(id), None)).collect();
        StudySession::new(DeckId::new(1), cards).unwrap()
    }

    fn answer(session: &mut StudySession, quality: RecallQuality) -> SessionStep {
        session.reveal().unwrap();
        session.respond(&Scheduler::new(), quality, fixed_now()).unwrap()
    }

    #[test]
    fn empty_list_is_rejected() {
        let err = StudySession::new(DeckId::new(1), Vec::new()).unwrap_err();
        assert_eq!(err, SessionError::Empty);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn starts_awaiting_reveal_on_first_card() {
        let view = session(3).view();
        assert_eq!(view.current_card_id, Some(CardId::new(1)));
        assert!(!view.revealed);
        assert_eq!(view.index, 0);
        assert_eq!(view.total, 3);
        assert!(!view.complete);
        assert_eq!(view.progress_percent(), 0.0);
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut once = session(2);
        once.reveal().unwrap();
        let mut twice = session(2);
        twice.reveal().unwrap();
        twice.reveal().unwrap();
        assert_eq!(once.view(), twice.view());
        assert_eq!(twice.phase(), SessionPhase::AnswerRevealed);
    }

    #[test]
    fn three_cards_complete_then_reject_fourth_response() {
        let mut s = session(3);
        assert!(!answer(&mut s, RecallQuality::Good).finished);
        assert!(!answer(&mut s, RecallQuality::Again).finished);
        let last = answer(&mut s, RecallQuality::Easy);
        assert!(last.finished);
        assert_eq!(last.card_id, CardId::new(3));
        assert!(s.is_complete());
        assert_eq!(s.view().completed, 3);
        assert_eq!(s.view().current_card_id, None);

        let err = s
            .respond(&Scheduler::new(), RecallQuality::Good, fixed_now())
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidState {
                operation: SessionOperation::Respond,
                phase: SessionPhase::Complete,
            }
        );
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(s.reveal().is_err());
    }

    #[test]
    fn respond_before_reveal_is_invalid() {
        let mut s = session(2);
        let err = s
            .respond(&Scheduler::new(), RecallQuality::Good, fixed_now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(matches!(s.skip(), Err(SessionError::InvalidState { .. })));
        assert_eq!(s.view().index, 0);
    }

    #[test]
    fn respond_updates_memory_state() {
        let mut s = session(2);
        let step = answer(&mut s, RecallQuality::Easy);
        let state = step.review.unwrap();
        assert_eq!(state.status, CardStatus::Learned);
        assert_eq!(state.interval, 6);
        assert_eq!(s.cards()[0].memory.as_ref(), Some(&state));
        assert_eq!(s.phase(), SessionPhase::AwaitingReveal);
        assert_eq!(s.view().current_card_id, Some(CardId::new(2)));
    }

    #[test]
    fn respond_schedules_from_existing_state() {
        let prior = Scheduler::new()
            .review(None, RecallQuality::Good, utc_date(2024, 1, 1))
            .unwrap();
        let mut s = StudySession::new(
            DeckId::new(9),
            vec![SessionCard::new(CardId::new(5), Some(prior))],
        )
        .unwrap();
        s.reveal().unwrap();
        let step = s
            .respond(&Scheduler::new(), RecallQuality::Hard, utc_date(2024, 1, 7))
            .unwrap();
        let state = step.review.unwrap();
        assert_eq!(state.interval, 1);
        assert_eq!(state.repetitions, 2);
        assert_eq!(state.next_review, utc_date(2024, 1, 8));
    }

    #[test]
    fn skip_advances_without_touching_memory() {
        let mut s = session(2);
        s.reveal().unwrap();
        let step = s.skip().unwrap();
        assert_eq!(step.card_id, CardId::new(1));
        assert!(step.review.is_none());
        assert!(!step.finished);
        assert!(s.cards()[0].memory.is_none());
        assert_eq!(s.view().completed, 0);

        s.reveal().unwrap();
        assert!(s.skip().unwrap().finished);
        assert!(s.is_complete());
    }

    #[test]
    fn restart_only_from_complete_and_keeps_order() {
        let mut s = session(3);
        assert!(matches!(
            s.restart(),
            Err(SessionError::InvalidState {
                operation: SessionOperation::Restart,
                ..
            })
        ));

        let original: Vec<_> = s.card_ids().collect();
        for _ in 0..3 {
            answer(&mut s, RecallQuality::Good);
        }
        s.restart().unwrap();

        let view = s.view();
        assert_eq!(view.index, 0);
        assert_eq!(view.completed, 0);
        assert!(!view.revealed);
        assert!(!view.complete);
        assert_eq!(s.card_ids().collect::<Vec<_>>(), original);
        assert!(s.cards().iter().all(|card| card.memory.is_some()));
    }

    #[test]
    fn progress_counts_revealed_as_half() {
        let mut s = session(4);
        answer(&mut s, RecallQuality::Good);
        s.reveal().unwrap();
        assert_eq!(s.view().progress_percent(), 37.5);
        assert_eq!(s.view().remaining(), 3);
    }

    #[test]
    fn scheduler_error_leaves_session_unchanged() {
        let broken = CardMemoryState {
            status: CardStatus::Review,
            ease_factor: 0.5,
            interval: 3,
            repetitions: 1,
            next_review: fixed_now(),
            last_reviewed: None,
        };
        let mut s = StudySession::new(
            DeckId::new(1),
            vec![SessionCard::new(CardId::new(1), Some(broken))],
        )
        .unwrap();
        s.reveal().unwrap();
        let err = s
            .respond(&Scheduler::new(), RecallQuality::Good, fixed_now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(s.phase(), SessionPhase::AnswerRevealed);
        assert_eq!(s.view().completed, 0);
    }
}
