use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::{
    BlockedRange, Booking, BookingStatus, ScheduleRule, TimeRange, WaitlistEntry, WaitlistStatus,
};

use super::{
    BookingStore, ConflictStore, ScheduleStore, ServiceCatalog, StoreError, StoreResult,
    WaitlistStore,
};

#[derive(Default)]
struct MemoryState {
    rules: HashMap<Uuid, ScheduleRule>,
    blocked: HashMap<Uuid, BlockedRange>,
    bookings: HashMap<Uuid, Booking>,
    // Insertion order doubles as the FIFO tie-break.
    waitlist: Vec<WaitlistEntry>,
    services: HashMap<Uuid, i32>,
}

impl MemoryState {
    fn slot_taken(&self, candidate: &Booking) -> bool {
        let range = candidate.range();

        let booked = self.bookings.values().any(|b| {
            b.id != candidate.id
                && b.professional_id == candidate.professional_id
                && b.holds_slot()
                && b.range().overlaps(&range)
        });

        booked
            || self
                .blocked
                .values()
                .any(|r| r.professional_id == candidate.professional_id && r.range().overlaps(&range))
    }
}

/// In-process store. Each write takes the single write lock, so the
/// check-then-write operations are serialised exactly like a transaction.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_service(&self, service_id: Uuid, duration_minutes: i32) {
        self.state.write().await.services.insert(service_id, duration_minutes);
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn rules_for_day(&self, professional_id: Uuid, day_of_week: i32) -> StoreResult<Vec<ScheduleRule>> {
        let state = self.state.read().await;
        let mut rules: Vec<ScheduleRule> = state
            .rules
            .values()
            .filter(|r| r.professional_id == professional_id && r.day_of_week == day_of_week && r.active)
            .cloned()
            .collect();
        rules.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(rules)
    }

    async fn list_rules(&self, professional_id: Uuid) -> StoreResult<Vec<ScheduleRule>> {
        let state = self.state.read().await;
        let mut rules: Vec<ScheduleRule> = state
            .rules
            .values()
            .filter(|r| r.professional_id == professional_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.day_of_week, r.start_time));
        Ok(rules)
    }

    async fn get_rule(&self, rule_id: Uuid) -> StoreResult<Option<ScheduleRule>> {
        Ok(self.state.read().await.rules.get(&rule_id).cloned())
    }

    async fn insert_rule(&self, rule: &ScheduleRule) -> StoreResult<ScheduleRule> {
        self.state.write().await.rules.insert(rule.id, rule.clone());
        Ok(rule.clone())
    }

    async fn update_rule(&self, rule: &ScheduleRule) -> StoreResult<ScheduleRule> {
        let mut state = self.state.write().await;
        match state.rules.get_mut(&rule.id) {
            Some(existing) => {
                *existing = rule.clone();
                Ok(rule.clone())
            }
            None => Err(StoreError::NotFound(format!("schedule rule {}", rule.id))),
        }
    }

    async fn get_blocked_range(&self, range_id: Uuid) -> StoreResult<Option<BlockedRange>> {
        Ok(self.state.read().await.blocked.get(&range_id).cloned())
    }

    async fn insert_blocked_range(&self, range: &BlockedRange) -> StoreResult<BlockedRange> {
        self.state.write().await.blocked.insert(range.id, range.clone());
        Ok(range.clone())
    }

    async fn delete_blocked_range(&self, range_id: Uuid) -> StoreResult<bool> {
        Ok(self.state.write().await.blocked.remove(&range_id).is_some())
    }
}

#[async_trait]
impl ConflictStore for MemoryStore {
    async fn bookings_overlapping(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.professional_id == professional_id && b.holds_slot() && b.range().overlaps(range))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }

    async fn blocked_ranges_overlapping(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<BlockedRange>> {
        let state = self.state.read().await;
        let mut ranges: Vec<BlockedRange> = state
            .blocked
            .values()
            .filter(|r| r.professional_id == professional_id && r.range().overlaps(range))
            .cloned()
            .collect();
        ranges.sort_by_key(|r| r.start_time);
        Ok(ranges)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn get_booking(&self, booking_id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&booking_id).cloned())
    }

    async fn bookings_for_professional(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.professional_id == professional_id && b.range().overlaps(range))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.start_time, b.created_at));
        Ok(bookings)
    }

    async fn insert_if_free(&self, booking: &Booking) -> StoreResult<Booking> {
        let mut state = self.state.write().await;
        if booking.holds_slot() && state.slot_taken(booking) {
            return Err(StoreError::SlotTaken);
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking.clone())
    }

    async fn move_if_free(&self, booking: &Booking, expected: BookingStatus) -> StoreResult<Option<Booking>> {
        let mut state = self.state.write().await;
        let current = state
            .bookings
            .get(&booking.id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", booking.id)))?;

        if current.status != expected {
            return Ok(None);
        }
        if state.slot_taken(booking) {
            return Err(StoreError::SlotTaken);
        }

        state.bookings.insert(booking.id, booking.clone());
        Ok(Some(booking.clone()))
    }

    async fn update_if_status(&self, booking: &Booking, expected: BookingStatus) -> StoreResult<Option<Booking>> {
        let mut state = self.state.write().await;
        match state.bookings.get_mut(&booking.id) {
            Some(current) if current.status == expected => {
                *current = booking.clone();
                Ok(Some(booking.clone()))
            }
            Some(_) => Ok(None),
            None => Err(StoreError::NotFound(format!("booking {}", booking.id))),
        }
    }
}

#[async_trait]
impl WaitlistStore for MemoryStore {
    async fn insert_entry(&self, entry: &WaitlistEntry) -> StoreResult<WaitlistEntry> {
        self.state.write().await.waitlist.push(entry.clone());
        Ok(entry.clone())
    }

    async fn get_entry(&self, entry_id: Uuid) -> StoreResult<Option<WaitlistEntry>> {
        let state = self.state.read().await;
        Ok(state.waitlist.iter().find(|e| e.id == entry_id).cloned())
    }

    async fn active_entries(&self, professional_id: Uuid, date: NaiveDate) -> StoreResult<Vec<WaitlistEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<WaitlistEntry> = state
            .waitlist
            .iter()
            .filter(|e| {
                e.professional_id == professional_id
                    && e.preferred_date == date
                    && e.status == WaitlistStatus::Active
            })
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn entries_for_client(&self, client_id: Uuid) -> StoreResult<Vec<WaitlistEntry>> {
        let state = self.state.read().await;
        Ok(state.waitlist.iter().filter(|e| e.client_id == client_id).cloned().collect())
    }

    async fn entries_for_professional(&self, professional_id: Uuid, date: Option<NaiveDate>) -> StoreResult<Vec<WaitlistEntry>> {
        let state = self.state.read().await;
        Ok(state
            .waitlist
            .iter()
            .filter(|e| e.professional_id == professional_id && date.map_or(true, |d| e.preferred_date == d))
            .cloned()
            .collect())
    }

    async fn update_entry_if_status(&self, entry: &WaitlistEntry, expected: WaitlistStatus) -> StoreResult<Option<WaitlistEntry>> {
        let mut state = self.state.write().await;
        match state.waitlist.iter_mut().find(|e| e.id == entry.id) {
            Some(current) if current.status == expected => {
                *current = entry.clone();
                Ok(Some(entry.clone()))
            }
            Some(_) => Ok(None),
            None => Err(StoreError::NotFound(format!("waitlist entry {}", entry.id))),
        }
    }
}

#[async_trait]
impl ServiceCatalog for MemoryStore {
    async fn duration_minutes(&self, service_id: Uuid) -> StoreResult<Option<i32>> {
        Ok(self.state.read().await.services.get(&service_id).copied())
    }
}
