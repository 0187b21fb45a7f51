use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use availability_cell::models::{
    AvailabilityError, BlockRangeRequest, CreateScheduleRuleRequest, UpdateScheduleRuleRequest,
};
use availability_cell::services::{AvailabilityEngine, ScheduleService, SlotGenerator};
use shared_database::{BookingStore, MemoryStore, ScheduleStore};
use shared_models::{Booking, BookingStatus, CreatedVia, ScheduleRule};
use shared_utils::clock::FixedClock;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn rule(professional_id: Uuid, start: NaiveTime, end: NaiveTime, buffer: i32) -> ScheduleRule {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    ScheduleRule {
        id: Uuid::new_v4(),
        professional_id,
        day_of_week: 1,
        start_time: start,
        end_time: end,
        slot_duration_minutes: 30,
        buffer_minutes: buffer,
        active: true,
        created_at: created,
        updated_at: created,
    }
}

fn booking(professional_id: Uuid, start: DateTime<Utc>, status: BookingStatus) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        professional_id,
        client_id: Uuid::new_v4(),
        pet_id: Uuid::new_v4(),
        service_id: None,
        start_time: start,
        duration_minutes: 30,
        status,
        confirmed_at: None,
        cancelled_at: None,
        cancellation_reason: None,
        created_via: CreatedVia::Client,
        notes: None,
        created_at: start - Duration::days(1),
        updated_at: start - Duration::days(1),
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    engine: AvailabilityEngine,
    schedules: ScheduleService,
    professional_id: Uuid,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let professional_id = Uuid::new_v4();
    store
        .insert_rule(&rule(professional_id, hm(9, 0), hm(12, 0), 0))
        .await
        .unwrap();

    let engine = AvailabilityEngine::new(store.clone(), store.clone(), store.clone(), 30);
    let clock = Arc::new(FixedClock::new(at(monday(), 7, 0)));
    let schedules = ScheduleService::new(store.clone(), store.clone(), clock);

    Fixture {
        store,
        engine,
        schedules,
        professional_id,
    }
}

#[test]
fn test_slot_count_matches_window_over_step() {
    let professional_id = Uuid::new_v4();
    let cases = [
        // (start, end, buffer, duration)
        (hm(9, 0), hm(12, 0), 0, 30),
        (hm(9, 0), hm(12, 0), 15, 30),
        (hm(8, 0), hm(17, 0), 10, 50),
        (hm(13, 0), hm(14, 0), 0, 20),
        (hm(9, 0), hm(10, 0), 0, 45),
    ];

    for (start, end, buffer, duration) in cases {
        let r = rule(professional_id, start, end, buffer);
        let slots: Vec<_> = SlotGenerator::generate(&r, monday(), duration).collect();

        let window = (end - start).num_minutes();
        let expected = window / (duration + buffer) as i64;
        assert_eq!(slots.len() as i64, expected, "window {} step {}", window, duration + buffer);

        for slot in &slots {
            assert_eq!(slot.duration_minutes(), duration as i64);
        }
        for pair in slots.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }
}

#[test]
fn test_slot_generator_ignores_other_weekdays() {
    let r = rule(Uuid::new_v4(), hm(9, 0), hm(12, 0), 0);
    let tuesday = monday().succ_opt().unwrap();
    assert_eq!(SlotGenerator::generate(&r, tuesday, 30).count(), 0);
}

#[tokio::test]
async fn test_scenario_a_empty_day_returns_full_grid() {
    let f = fixture().await;

    let slots = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();

    let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
    let expected: Vec<_> = [(9, 0), (9, 30), (10, 0), (10, 30), (11, 0), (11, 30)]
        .iter()
        .map(|&(h, m)| at(monday(), h, m))
        .collect();
    assert_eq!(starts, expected);
}

#[tokio::test]
async fn test_scenario_b_booked_slot_is_excluded() {
    let f = fixture().await;
    f.store
        .insert_if_free(&booking(f.professional_id, at(monday(), 10, 0), BookingStatus::Scheduled))
        .await
        .unwrap();

    let slots = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();

    assert_eq!(slots.len(), 5);
    assert!(slots.iter().all(|s| s.start != at(monday(), 10, 0)));
}

#[tokio::test]
async fn test_terminal_bookings_do_not_block() {
    let f = fixture().await;
    for status in [BookingStatus::Cancelled, BookingStatus::NoShow] {
        f.store
            .insert_if_free(&booking(f.professional_id, at(monday(), 10, 0), status))
            .await
            .unwrap();
    }

    let slots = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();
    assert_eq!(slots.len(), 6);
}

#[tokio::test]
async fn test_blocked_range_removes_overlapping_slots() {
    let f = fixture().await;
    f.schedules
        .block_range(
            f.professional_id,
            BlockRangeRequest {
                start_time: at(monday(), 10, 15),
                end_time: at(monday(), 11, 0),
                reason: Some("Surgery".to_string()),
            },
        )
        .await
        .unwrap();

    let slots = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();

    // 10:00 and 10:30 overlap the block; 11:00 only touches its end.
    let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
    assert_eq!(
        starts,
        vec![at(monday(), 9, 0), at(monday(), 9, 30), at(monday(), 11, 0), at(monday(), 11, 30)]
    );
}

#[tokio::test]
async fn test_availability_is_idempotent() {
    let f = fixture().await;
    f.store
        .insert_if_free(&booking(f.professional_id, at(monday(), 9, 30), BookingStatus::Pending))
        .await
        .unwrap();

    let first = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();
    let second = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_excluded_booking_does_not_block_itself() {
    let f = fixture().await;
    let existing = booking(f.professional_id, at(monday(), 10, 0), BookingStatus::Confirmed);
    f.store.insert_if_free(&existing).await.unwrap();

    let slots = f
        .engine
        .available_slots_excluding(f.professional_id, monday(), None, Some(existing.id))
        .await
        .unwrap();
    assert_eq!(slots.len(), 6);

    assert!(!f
        .engine
        .is_slot_available(f.professional_id, at(monday(), 10, 0), None, None)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_service_duration_drives_the_grid() {
    let f = fixture().await;
    let service_id = Uuid::new_v4();
    f.store.add_service(service_id, 60).await;

    let slots = f
        .engine
        .available_slots(f.professional_id, monday(), Some(service_id))
        .await
        .unwrap();

    assert_eq!(slots.len(), 3);
    assert!(slots.iter().all(|s| s.duration_minutes() == 60));
}

#[tokio::test]
async fn test_unknown_service_is_not_found() {
    let f = fixture().await;

    let result = f
        .engine
        .available_slots(f.professional_id, monday(), Some(Uuid::new_v4()))
        .await;
    assert_matches!(result, Err(AvailabilityError::NotFound(_)));
}

#[tokio::test]
async fn test_no_rule_means_no_slots() {
    let f = fixture().await;
    let sunday = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    let slots = f.engine.available_slots(f.professional_id, sunday, None).await.unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_most_recently_updated_rule_wins() {
    let f = fixture().await;
    let mut newer = rule(f.professional_id, hm(14, 0), hm(15, 0), 0);
    newer.updated_at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    f.store.insert_rule(&newer).await.unwrap();

    let slots = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].start, at(monday(), 14, 0));
}

#[tokio::test]
async fn test_create_rule_validates_window() {
    let f = fixture().await;

    let result = f
        .schedules
        .create_rule(
            f.professional_id,
            CreateScheduleRuleRequest {
                day_of_week: 2,
                start_time: hm(12, 0),
                end_time: hm(9, 0),
                slot_duration_minutes: 30,
                buffer_minutes: None,
            },
        )
        .await;
    assert_matches!(result, Err(AvailabilityError::Validation(_)));

    let result = f
        .schedules
        .create_rule(
            f.professional_id,
            CreateScheduleRuleRequest {
                day_of_week: 7,
                start_time: hm(9, 0),
                end_time: hm(12, 0),
                slot_duration_minutes: 30,
                buffer_minutes: None,
            },
        )
        .await;
    assert_matches!(result, Err(AvailabilityError::Validation(_)));
}

#[tokio::test]
async fn test_update_rule_rejects_buffer_longer_than_a_day() {
    let f = fixture().await;
    let rules = f.schedules.list_rules(f.professional_id).await.unwrap();

    let result = f
        .schedules
        .update_rule(
            rules[0].id,
            UpdateScheduleRuleRequest {
                buffer_minutes: Some(i32::MAX),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(AvailabilityError::Validation(_)));

    let result = f
        .schedules
        .update_rule(
            rules[0].id,
            UpdateScheduleRuleRequest {
                slot_duration_minutes: Some(24 * 60 + 1),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(AvailabilityError::Validation(_)));

    let slots = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();
    assert_eq!(slots.len(), 6);
}

#[tokio::test]
async fn test_deactivated_rule_stops_producing_slots() {
    let f = fixture().await;
    let rules = f.schedules.list_rules(f.professional_id).await.unwrap();
    assert_eq!(rules.len(), 1);

    let updated = f
        .schedules
        .update_rule(
            rules[0].id,
            UpdateScheduleRuleRequest {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.active);

    let slots = f.engine.available_slots(f.professional_id, monday(), None).await.unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_unblock_range_restores_slots() {
    let f = fixture().await;
    let block = f
        .schedules
        .block_range(
            f.professional_id,
            BlockRangeRequest {
                start_time: at(monday(), 9, 0),
                end_time: at(monday(), 12, 0),
                reason: None,
            },
        )
        .await
        .unwrap();
    assert!(f.engine.available_slots(f.professional_id, monday(), None).await.unwrap().is_empty());

    let listed = f
        .schedules
        .list_blocked_ranges(f.professional_id, at(monday(), 0, 0), at(monday(), 23, 0))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    f.schedules.unblock_range(block.id).await.unwrap();
    assert_eq!(f.engine.available_slots(f.professional_id, monday(), None).await.unwrap().len(), 6);

    assert_matches!(f.schedules.unblock_range(block.id).await, Err(AvailabilityError::NotFound(_)));
}

#[tokio::test]
async fn test_block_range_rejects_inverted_interval() {
    let f = fixture().await;
    let result = f
        .schedules
        .block_range(
            f.professional_id,
            BlockRangeRequest {
                start_time: at(monday(), 11, 0),
                end_time: at(monday(), 10, 0),
                reason: None,
            },
        )
        .await;
    assert_matches!(result, Err(AvailabilityError::Validation(_)));
}
