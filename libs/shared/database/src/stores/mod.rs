//! Storage ports for the scheduling engine.
//!
//! Every method is typed; adapters decide how a query maps to their engine.
//! The only operations that must be atomic are the `*_if_free` and
//! `*_if_status` writes.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use shared_models::{
    BlockedRange, Booking, BookingStatus, ScheduleRule, TimeRange, WaitlistEntry, WaitlistStatus,
};

pub mod memory;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The overlap/uniqueness guard on non-terminal bookings rejected the write.
    #[error("slot already taken")]
    SlotTaken,

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage error: {0}")]
    Backend(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        if crate::supabase::SupabaseError::is_conflict(&err) {
            StoreError::SlotTaken
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("malformed row: {}", err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Active rules for a professional's weekday, most recently updated first.
    async fn rules_for_day(&self, professional_id: Uuid, day_of_week: i32) -> StoreResult<Vec<ScheduleRule>>;

    async fn list_rules(&self, professional_id: Uuid) -> StoreResult<Vec<ScheduleRule>>;

    async fn get_rule(&self, rule_id: Uuid) -> StoreResult<Option<ScheduleRule>>;

    async fn insert_rule(&self, rule: &ScheduleRule) -> StoreResult<ScheduleRule>;

    async fn update_rule(&self, rule: &ScheduleRule) -> StoreResult<ScheduleRule>;

    async fn get_blocked_range(&self, range_id: Uuid) -> StoreResult<Option<BlockedRange>>;

    async fn insert_blocked_range(&self, range: &BlockedRange) -> StoreResult<BlockedRange>;

    /// Returns `false` when nothing was deleted.
    async fn delete_blocked_range(&self, range_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ConflictStore: Send + Sync {
    /// Non-terminal bookings whose interval intersects `range`.
    async fn bookings_overlapping(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<Booking>>;

    async fn blocked_ranges_overlapping(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<BlockedRange>>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_booking(&self, booking_id: Uuid) -> StoreResult<Option<Booking>>;

    /// All bookings, any status, intersecting `range`, ordered by start.
    async fn bookings_for_professional(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<Booking>>;

    /// Insert `booking` unless a non-terminal booking or a blocked range of
    /// the same professional overlaps it, as one atomic step.
    async fn insert_if_free(&self, booking: &Booking) -> StoreResult<Booking>;

    /// Write a moved booking if its stored status is still `expected` and the
    /// new interval is free (ignoring the booking itself), as one atomic step.
    /// `Ok(None)` means the status changed underneath.
    async fn move_if_free(&self, booking: &Booking, expected: BookingStatus) -> StoreResult<Option<Booking>>;

    /// Compare-and-set on status. `Ok(None)` means the stored status was not `expected`.
    async fn update_if_status(&self, booking: &Booking, expected: BookingStatus) -> StoreResult<Option<Booking>>;
}

#[async_trait]
pub trait WaitlistStore: Send + Sync {
    async fn insert_entry(&self, entry: &WaitlistEntry) -> StoreResult<WaitlistEntry>;

    async fn get_entry(&self, entry_id: Uuid) -> StoreResult<Option<WaitlistEntry>>;

    /// Active entries for the date in FIFO order.
    async fn active_entries(&self, professional_id: Uuid, date: NaiveDate) -> StoreResult<Vec<WaitlistEntry>>;

    async fn entries_for_client(&self, client_id: Uuid) -> StoreResult<Vec<WaitlistEntry>>;

    async fn entries_for_professional(&self, professional_id: Uuid, date: Option<NaiveDate>) -> StoreResult<Vec<WaitlistEntry>>;

    async fn update_entry_if_status(&self, entry: &WaitlistEntry, expected: WaitlistStatus) -> StoreResult<Option<WaitlistEntry>>;
}

/// Read-only view of the service catalogue.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn duration_minutes(&self, service_id: Uuid) -> StoreResult<Option<i32>>;
}
