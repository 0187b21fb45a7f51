use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::anyhow;
use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use shared_database::MemoryStore;
use shared_models::{Slot, WaitlistStatus};
use shared_utils::clock::FixedClock;
use waitlist_cell::models::{AddWaitlistEntryRequest, WaitlistError};
use waitlist_cell::services::{Notifier, WaitlistManager, SLOT_AVAILABLE_EVENT};

struct RecordingNotifier {
    sender: Mutex<mpsc::UnboundedSender<(Uuid, String, Value)>>,
    fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: Uuid, event_type: &str, payload: Value) -> anyhow::Result<()> {
        let _ = self
            .sender
            .lock()
            .await
            .send((user_id, event_type.to_string(), payload));
        if self.fail {
            return Err(anyhow!("delivery failed"));
        }
        Ok(())
    }
}

struct Fixture {
    manager: WaitlistManager,
    clock: FixedClock,
    notifications: mpsc::UnboundedReceiver<(Uuid, String, Value)>,
    professional_id: Uuid,
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&monday().and_hms_opt(hour, minute, 0).unwrap())
}

fn fixture_with(fail: bool) -> Fixture {
    let (sender, notifications) = mpsc::unbounded_channel();
    let notifier = Arc::new(RecordingNotifier {
        sender: Mutex::new(sender),
        fail,
    });
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 5, 30, 8, 0, 0).unwrap());
    let manager = WaitlistManager::new(Arc::new(MemoryStore::new()), notifier, Arc::new(clock.clone()));

    Fixture {
        manager,
        clock,
        notifications,
        professional_id: Uuid::new_v4(),
    }
}

fn fixture() -> Fixture {
    fixture_with(false)
}

fn request(professional_id: Uuid, preferred_time: Option<NaiveTime>) -> AddWaitlistEntryRequest {
    AddWaitlistEntryRequest {
        professional_id,
        client_id: None,
        service_id: None,
        pet_id: Uuid::new_v4(),
        preferred_date: monday(),
        preferred_time,
        notes: Some("Any time works".to_string()),
    }
}

async fn next_notification(f: &mut Fixture) -> (Uuid, String, Value) {
    tokio::time::timeout(StdDuration::from_secs(1), f.notifications.recv())
        .await
        .expect("notification dispatched")
        .expect("channel open")
}

#[tokio::test]
async fn test_add_creates_active_entry() {
    let f = fixture();
    let client_id = Uuid::new_v4();

    let entry = f.manager.add(client_id, request(f.professional_id, None)).await.unwrap();

    assert_eq!(entry.status, WaitlistStatus::Active);
    assert_eq!(entry.client_id, client_id);
    assert!(entry.notified_at.is_none());
    assert_eq!(f.manager.get(entry.id).await.unwrap().id, entry.id);
}

#[tokio::test]
async fn test_freed_slot_notifies_oldest_match_first() {
    let mut f = fixture();
    let first_client = Uuid::new_v4();
    let second_client = Uuid::new_v4();

    let first = f.manager.add(first_client, request(f.professional_id, None)).await.unwrap();
    f.clock.advance(Duration::minutes(5));
    let second = f.manager.add(second_client, request(f.professional_id, None)).await.unwrap();

    let notified = f
        .manager
        .on_slot_freed(f.professional_id, Slot::new(at(10, 0), at(10, 30)))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(notified.id, first.id);
    assert_eq!(notified.status, WaitlistStatus::Notified);
    assert!(notified.notified_at.is_some());
    assert_eq!(f.manager.get(second.id).await.unwrap().status, WaitlistStatus::Active);

    let (user_id, event, payload) = next_notification(&mut f).await;
    assert_eq!(user_id, first_client);
    assert_eq!(event, SLOT_AVAILABLE_EVENT);
    assert_eq!(payload["entry_id"], first.id.to_string());
    assert_eq!(payload["slot_start"], "2025-06-02T10:00:00Z");

    // The next freed slot goes to the remaining entry.
    let notified = f
        .manager
        .on_slot_freed(f.professional_id, Slot::new(at(11, 0), at(11, 30)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notified.id, second.id);
}

#[tokio::test]
async fn test_preferred_time_must_fall_in_freed_slot() {
    let f = fixture();
    let entry = f
        .manager
        .add(Uuid::new_v4(), request(f.professional_id, NaiveTime::from_hms_opt(14, 0, 0)))
        .await
        .unwrap();

    let miss = f
        .manager
        .on_slot_freed(f.professional_id, Slot::new(at(10, 0), at(10, 30)))
        .await
        .unwrap();
    assert!(miss.is_none());

    let hit = f
        .manager
        .on_slot_freed(f.professional_id, Slot::new(at(13, 45), at(14, 15)))
        .await
        .unwrap();
    assert_eq!(hit.map(|e| e.id), Some(entry.id));
}

#[tokio::test]
async fn test_other_dates_and_professionals_are_ignored() {
    let f = fixture();
    f.manager.add(Uuid::new_v4(), request(f.professional_id, None)).await.unwrap();

    let tuesday = Slot::new(at(10, 0) + Duration::days(1), at(10, 30) + Duration::days(1));
    assert!(f.manager.on_slot_freed(f.professional_id, tuesday).await.unwrap().is_none());

    let elsewhere = f
        .manager
        .on_slot_freed(Uuid::new_v4(), Slot::new(at(10, 0), at(10, 30)))
        .await
        .unwrap();
    assert!(elsewhere.is_none());
}

#[tokio::test]
async fn test_notifier_failure_is_swallowed() {
    let mut f = fixture_with(true);
    let entry = f.manager.add(Uuid::new_v4(), request(f.professional_id, None)).await.unwrap();

    let notified = f
        .manager
        .on_slot_freed(f.professional_id, Slot::new(at(9, 0), at(9, 30)))
        .await
        .unwrap();
    assert_eq!(notified.map(|e| e.id), Some(entry.id));

    next_notification(&mut f).await;
    assert_eq!(f.manager.get(entry.id).await.unwrap().status, WaitlistStatus::Notified);
}

#[tokio::test]
async fn test_mark_booked_and_cancel_are_terminal() {
    let f = fixture();
    let booked = f.manager.add(Uuid::new_v4(), request(f.professional_id, None)).await.unwrap();
    let withdrawn = f.manager.add(Uuid::new_v4(), request(f.professional_id, None)).await.unwrap();

    f.manager
        .on_slot_freed(f.professional_id, Slot::new(at(9, 0), at(9, 30)))
        .await
        .unwrap();

    let booked = f.manager.mark_booked(booked.id).await.unwrap();
    assert_eq!(booked.status, WaitlistStatus::Booked);

    let withdrawn = f.manager.cancel(withdrawn.id).await.unwrap();
    assert_eq!(withdrawn.status, WaitlistStatus::Cancelled);

    assert_matches!(
        f.manager.cancel(booked.id).await,
        Err(WaitlistError::InvalidState(WaitlistStatus::Booked))
    );
    assert_matches!(
        f.manager.mark_booked(withdrawn.id).await,
        Err(WaitlistError::InvalidState(WaitlistStatus::Cancelled))
    );
}

#[tokio::test]
async fn test_unknown_entry_is_not_found() {
    let f = fixture();
    let missing = Uuid::new_v4();

    assert_matches!(f.manager.get(missing).await, Err(WaitlistError::NotFound(id)) if id == missing);
    assert_matches!(f.manager.cancel(missing).await, Err(WaitlistError::NotFound(_)));
}

#[tokio::test]
async fn test_listing_by_client_and_professional() {
    let f = fixture();
    let client_id = Uuid::new_v4();
    f.manager.add(client_id, request(f.professional_id, None)).await.unwrap();
    f.manager.add(client_id, request(Uuid::new_v4(), None)).await.unwrap();
    f.manager.add(Uuid::new_v4(), request(f.professional_id, None)).await.unwrap();

    assert_eq!(f.manager.list_for_client(client_id).await.unwrap().len(), 2);
    assert_eq!(f.manager.list_for_professional(f.professional_id, None).await.unwrap().len(), 2);

    let other_day = monday().succ_opt().unwrap();
    assert!(f
        .manager
        .list_for_professional(f.professional_id, Some(other_day))
        .await
        .unwrap()
        .is_empty());
}
