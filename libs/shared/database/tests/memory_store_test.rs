use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use shared_database::{BookingStore, ConflictStore, MemoryStore, ScheduleStore, StoreError};
use shared_models::{BlockedRange, Booking, BookingStatus, CreatedVia, TimeRange};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
}

fn booking(professional_id: Uuid, start: DateTime<Utc>, minutes: i32) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        professional_id,
        client_id: Uuid::new_v4(),
        pet_id: Uuid::new_v4(),
        service_id: None,
        start_time: start,
        duration_minutes: minutes,
        status: BookingStatus::Scheduled,
        confirmed_at: None,
        cancelled_at: None,
        cancellation_reason: None,
        created_via: CreatedVia::Professional,
        notes: None,
        created_at: start - Duration::days(1),
        updated_at: start - Duration::days(1),
    }
}

#[tokio::test]
async fn test_insert_if_free_rejects_any_overlap() {
    let store = MemoryStore::new();
    let professional_id = Uuid::new_v4();

    store.insert_if_free(&booking(professional_id, at(10, 0), 60)).await.unwrap();

    let result = store.insert_if_free(&booking(professional_id, at(10, 30), 30)).await;
    assert_matches!(result, Err(StoreError::SlotTaken));

    // Touching intervals and other professionals are fine.
    store.insert_if_free(&booking(professional_id, at(11, 0), 30)).await.unwrap();
    store.insert_if_free(&booking(Uuid::new_v4(), at(10, 0), 60)).await.unwrap();
}

#[tokio::test]
async fn test_blocked_range_rejects_insert() {
    let store = MemoryStore::new();
    let professional_id = Uuid::new_v4();
    store
        .insert_blocked_range(&BlockedRange {
            id: Uuid::new_v4(),
            professional_id,
            start_time: at(12, 0),
            end_time: at(13, 0),
            reason: Some("Lunch".to_string()),
            created_at: at(8, 0),
        })
        .await
        .unwrap();

    let result = store.insert_if_free(&booking(professional_id, at(12, 30), 30)).await;
    assert_matches!(result, Err(StoreError::SlotTaken));
}

#[tokio::test]
async fn test_update_if_status_only_when_expected() {
    let store = MemoryStore::new();
    let original = store.insert_if_free(&booking(Uuid::new_v4(), at(9, 0), 30)).await.unwrap();

    let mut cancelled = original.clone();
    cancelled.status = BookingStatus::Cancelled;

    assert!(store.update_if_status(&cancelled, BookingStatus::Pending).await.unwrap().is_none());
    let saved = store.update_if_status(&cancelled, BookingStatus::Scheduled).await.unwrap();
    assert_eq!(saved.map(|b| b.status), Some(BookingStatus::Cancelled));

    let missing = booking(Uuid::new_v4(), at(9, 0), 30);
    assert_matches!(
        store.update_if_status(&missing, BookingStatus::Scheduled).await,
        Err(StoreError::NotFound(_))
    );
}

#[tokio::test]
async fn test_move_if_free_ignores_self_but_not_others() {
    let store = MemoryStore::new();
    let professional_id = Uuid::new_v4();
    let mine = store.insert_if_free(&booking(professional_id, at(9, 0), 60)).await.unwrap();
    store.insert_if_free(&booking(professional_id, at(11, 0), 30)).await.unwrap();

    let mut shifted = mine.clone();
    shifted.start_time = at(9, 30);
    assert!(store.move_if_free(&shifted, BookingStatus::Scheduled).await.unwrap().is_some());

    let mut clash = shifted.clone();
    clash.start_time = at(10, 30);
    assert_matches!(
        store.move_if_free(&clash, BookingStatus::Scheduled).await,
        Err(StoreError::SlotTaken)
    );

    assert!(store.move_if_free(&clash, BookingStatus::Pending).await.unwrap().is_none());
}

#[tokio::test]
async fn test_conflict_queries_skip_terminal_bookings() {
    let store = MemoryStore::new();
    let professional_id = Uuid::new_v4();
    let live = store.insert_if_free(&booking(professional_id, at(9, 0), 30)).await.unwrap();

    let mut done = booking(professional_id, at(10, 0), 30);
    done.status = BookingStatus::Completed;
    store.insert_if_free(&done).await.unwrap();

    let day = TimeRange::day(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    let overlapping = store.bookings_overlapping(professional_id, &day).await.unwrap();
    assert_eq!(overlapping.iter().map(|b| b.id).collect::<Vec<_>>(), vec![live.id]);

    let all = store.bookings_for_professional(professional_id, &day).await.unwrap();
    assert_eq!(all.len(), 2);
}
