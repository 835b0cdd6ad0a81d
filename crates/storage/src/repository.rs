use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learn_core::model::{CardId, CardStatus, DeckId};
use learn_core::scheduler::CardMemoryState;
use learn_core::streak::DeckStreakState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Number of cards per learning status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub learning: u32,
    pub review: u32,
    pub learned: u32,
}

impl StatusCounts {
    pub fn add(&mut self, status: CardStatus) {
        let slot = match status {
            CardStatus::Learning => &mut self.learning,
            CardStatus::Review => &mut self.review,
            CardStatus::Learned => &mut self.learned,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.learning
            .saturating_add(self.review)
            .saturating_add(self.learned)
    }
}

/// Persistence for per-card memory state, one record per card.
#[async_trait]
pub trait MemoryStateRepository: Send + Sync {
    /// Fetch the stored state, or `None` for a card never reviewed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_memory_state(
        &self,
        card_id: CardId,
    ) -> Result<Option<CardMemoryState>, StorageError>;

    /// Insert or replace the state for a card.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn upsert_memory_state(
        &self,
        card_id: CardId,
        state: &CardMemoryState,
    ) -> Result<(), StorageError>;

    /// Remove a card's state when the card itself is deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete_memory_state(&self, card_id: CardId) -> Result<(), StorageError>;

    /// Fetch states for several cards, preserving the order of `ids`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any lookup fails.
    async fn get_memory_states(
        &self,
        ids: &[CardId],
    ) -> Result<Vec<Option<CardMemoryState>>, StorageError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            found.push(self.get_memory_state(*id).await?);
        }
        Ok(found)
    }
}

/// Persistence for per-deck streak state.
#[async_trait]
pub trait DeckStreakRepository: Send + Sync {
    /// Fetch a deck's streak; a deck never studied yields the default state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_streak(&self, deck_id: DeckId) -> Result<DeckStreakState, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn save_streak(&self, deck_id: DeckId, state: &DeckStreakState)
    -> Result<(), StorageError>;
}

/// Read-only aggregates over stored review activity, for reporting.
#[async_trait]
pub trait ReviewActivityRepository: Send + Sync {
    /// Cards whose last review falls in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn count_reviewed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn status_counts(&self) -> Result<StatusCounts, StorageError>;

    /// Cards reviewed at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn count_reviewed_since(&self, since: DateTime<Utc>) -> Result<u32, StorageError> {
        self.count_reviewed_between(since, DateTime::<Utc>::MAX_UTC)
            .await
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    memory: Arc<Mutex<HashMap<CardId, CardMemoryState>>>,
    streaks: Arc<Mutex<HashMap<DeckId, DeckStreakState>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl MemoryStateRepository for InMemoryRepository {
    async fn get_memory_state(
        &self,
        card_id: CardId,
    ) -> Result<Option<CardMemoryState>, StorageError> {
        Ok(lock(&self.memory)?.get(&card_id).cloned())
    }

    async fn upsert_memory_state(
        &self,
        card_id: CardId,
        state: &CardMemoryState,
    ) -> Result<(), StorageError> {
        lock(&self.memory)?.insert(card_id, state.clone());
        Ok(())
    }

    async fn delete_memory_state(&self, card_id: CardId) -> Result<(), StorageError> {
        lock(&self.memory)?.remove(&card_id);
        Ok(())
    }
}

#[async_trait]
impl DeckStreakRepository for InMemoryRepository {
    async fn get_streak(&self, deck_id: DeckId) -> Result<DeckStreakState, StorageError> {
        Ok(lock(&self.streaks)?
            .get(&deck_id)
            .copied()
            .unwrap_or_default())
    }

    async fn save_streak(
        &self,
        deck_id: DeckId,
        state: &DeckStreakState,
    ) -> Result<(), StorageError> {
        lock(&self.streaks)?.insert(deck_id, *state);
        Ok(())
    }
}

#[async_trait]
impl ReviewActivityRepository for InMemoryRepository {
    async fn count_reviewed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let guard = lock(&self.memory)?;
        let count = guard
            .values()
            .filter_map(|state| state.last_reviewed)
            .filter(|reviewed| *reviewed >= start && *reviewed < end)
            .count();
        u32::try_from(count).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn status_counts(&self) -> Result<StatusCounts, StorageError> {
        let guard = lock(&self.memory)?;
        let mut counts = StatusCounts::default();
        for state in guard.values() {
            counts.add(state.status);
        }
        Ok(counts)
    }
}

/// Aggregates the repository ports behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub memory: Arc<dyn MemoryStateRepository>,
    pub streaks: Arc<dyn DeckStreakRepository>,
    pub activity: Arc<dyn ReviewActivityRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self::from_repository(repo)
    }

    /// Use one adapter for every port.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: MemoryStateRepository + DeckStreakRepository + ReviewActivityRepository + Clone + 'static,
    {
        let memory: Arc<dyn MemoryStateRepository> = Arc::new(repo.clone());
        let streaks: Arc<dyn DeckStreakRepository> = Arc::new(repo.clone());
        let activity: Arc<dyn ReviewActivityRepository> = Arc::new(repo);
        Self {
            memory,
            streaks,
            activity,
        }
    }
}
