#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    DeckStreakRepository, InMemoryRepository, MemoryStateRepository, ReviewActivityRepository,
    StatusCounts, Storage, StorageError,
};
