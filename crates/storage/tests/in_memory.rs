use chrono::Duration;
use learn_core::model::{CardId, DeckId, RecallQuality};
use learn_core::scheduler::Scheduler;
use learn_core::streak::DeckStreakState;
use learn_core::time::utc_date;
use storage::{
    DeckStreakRepository, InMemoryRepository, MemoryStateRepository, ReviewActivityRepository,
    Storage,
};

#[tokio::test]
async fn batch_lookup_preserves_order_and_gaps() {
    let repo = InMemoryRepository::new();
    let state = Scheduler::new()
        .review(None, RecallQuality::Good, utc_date(2024, 1, 1))
        .unwrap();
    repo.upsert_memory_state(CardId::new(2), &state).await.unwrap();

    let found = repo
        .get_memory_states(&[CardId::new(1), CardId::new(2), CardId::new(3)])
        .await
        .unwrap();
    assert_eq!(found, vec![None, Some(state), None]);
}

#[tokio::test]
async fn delete_removes_state_with_its_card() {
    let repo = InMemoryRepository::new();
    let state = Scheduler::new()
        .review(None, RecallQuality::Again, utc_date(2024, 1, 1))
        .unwrap();
    repo.upsert_memory_state(CardId::new(1), &state).await.unwrap();
    repo.delete_memory_state(CardId::new(1)).await.unwrap();
    assert!(repo.get_memory_state(CardId::new(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn activity_counts_use_half_open_windows() {
    let repo = InMemoryRepository::new();
    let scheduler = Scheduler::new();
    let day = utc_date(2024, 4, 10);

    for (id, at) in [
        (1, day),
        (2, day + Duration::hours(23)),
        (3, day + Duration::days(1)),
    ] {
        let state = scheduler.review(None, RecallQuality::Good, at).unwrap();
        repo.upsert_memory_state(CardId::new(id), &state).await.unwrap();
    }

    let same_day = repo
        .count_reviewed_between(day, day + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(same_day, 2);
    assert_eq!(repo.count_reviewed_since(day).await.unwrap(), 3);

    let counts = repo.status_counts().await.unwrap();
    assert_eq!(counts.review, 3);
    assert_eq!(counts.total(), 3);
}

#[tokio::test]
async fn storage_ports_share_one_backend() {
    let storage = Storage::in_memory();
    let deck = DeckId::new(4);
    let state = DeckStreakState {
        current_streak: 3,
        last_studied: Some(utc_date(2024, 1, 1)),
    };
    storage.streaks.save_streak(deck, &state).await.unwrap();
    assert_eq!(storage.streaks.get_streak(deck).await.unwrap(), state);

    let review = Scheduler::new()
        .review(None, RecallQuality::Easy, utc_date(2024, 1, 1))
        .unwrap();
    storage
        .memory
        .upsert_memory_state(CardId::new(1), &review)
        .await
        .unwrap();
    assert_eq!(storage.activity.status_counts().await.unwrap().learned, 1);
}
