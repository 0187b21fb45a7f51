use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{
    BlockedRange, Booking, BookingStatus, ScheduleRule, TimeRange, WaitlistEntry, WaitlistStatus,
};

use crate::supabase::SupabaseClient;

use super::{
    BookingStore, ConflictStore, ScheduleStore, ServiceCatalog, StoreError, StoreResult,
    WaitlistStore,
};

/// PostgREST-backed adapter for every scheduling port. The atomic booking
/// writes go through the `book_slot` / `move_booking` functions from
/// `migrations/0001_scheduling.sql`.
pub struct SupabaseStore {
    supabase: Arc<SupabaseClient>,
}

fn ts(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn non_terminal_filter() -> String {
    let statuses: Vec<&str> = BookingStatus::NON_TERMINAL.iter().map(|s| s.as_str()).collect();
    format!("in.({})", statuses.join(","))
}

fn parse_rows<T: DeserializeOwned>(rows: Vec<Value>) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(StoreError::from)
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> StoreResult<Option<T>> {
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn select(&self, path: &str) -> StoreResult<Vec<Value>> {
        Ok(self.supabase.request(Method::GET, path, None).await?)
    }

    async fn write(&self, method: Method, path: &str, body: Value) -> StoreResult<Vec<Value>> {
        Ok(self.supabase.request_returning(method, path, Some(body)).await?)
    }
}

#[async_trait]
impl ScheduleStore for SupabaseStore {
    async fn rules_for_day(&self, professional_id: Uuid, day_of_week: i32) -> StoreResult<Vec<ScheduleRule>> {
        let path = format!(
            "/rest/v1/schedule_rules?professional_id=eq.{}&day_of_week=eq.{}&active=eq.true&order=updated_at.desc,id.desc",
            professional_id, day_of_week
        );
        parse_rows(self.select(&path).await?)
    }

    async fn list_rules(&self, professional_id: Uuid) -> StoreResult<Vec<ScheduleRule>> {
        let path = format!(
            "/rest/v1/schedule_rules?professional_id=eq.{}&order=day_of_week.asc,start_time.asc",
            professional_id
        );
        parse_rows(self.select(&path).await?)
    }

    async fn get_rule(&self, rule_id: Uuid) -> StoreResult<Option<ScheduleRule>> {
        let path = format!("/rest/v1/schedule_rules?id=eq.{}", rule_id);
        first_row(self.select(&path).await?)
    }

    async fn insert_rule(&self, rule: &ScheduleRule) -> StoreResult<ScheduleRule> {
        let rows = self.write(Method::POST, "/rest/v1/schedule_rules", serde_json::to_value(rule)?).await?;
        first_row(rows)?.ok_or_else(|| StoreError::Backend("Failed to create schedule rule".to_string()))
    }

    async fn update_rule(&self, rule: &ScheduleRule) -> StoreResult<ScheduleRule> {
        let path = format!("/rest/v1/schedule_rules?id=eq.{}", rule.id);
        let rows = self.write(Method::PATCH, &path, serde_json::to_value(rule)?).await?;
        first_row(rows)?.ok_or_else(|| StoreError::NotFound(format!("schedule rule {}", rule.id)))
    }

    async fn get_blocked_range(&self, range_id: Uuid) -> StoreResult<Option<BlockedRange>> {
        let path = format!("/rest/v1/blocked_ranges?id=eq.{}", range_id);
        first_row(self.select(&path).await?)
    }

    async fn insert_blocked_range(&self, range: &BlockedRange) -> StoreResult<BlockedRange> {
        let rows = self.write(Method::POST, "/rest/v1/blocked_ranges", serde_json::to_value(range)?).await?;
        first_row(rows)?.ok_or_else(|| StoreError::Backend("Failed to create blocked range".to_string()))
    }

    async fn delete_blocked_range(&self, range_id: Uuid) -> StoreResult<bool> {
        let path = format!("/rest/v1/blocked_ranges?id=eq.{}", range_id);
        let rows: Vec<Value> = self.supabase.request_returning(Method::DELETE, &path, None).await?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl ConflictStore for SupabaseStore {
    async fn bookings_overlapping(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<Booking>> {
        let path = format!(
            "/rest/v1/bookings?professional_id=eq.{}&status={}&start_time=lt.{}&end_time=gt.{}&order=start_time.asc",
            professional_id,
            non_terminal_filter(),
            ts(range.end),
            ts(range.start)
        );
        parse_rows(self.select(&path).await?)
    }

    async fn blocked_ranges_overlapping(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<BlockedRange>> {
        let path = format!(
            "/rest/v1/blocked_ranges?professional_id=eq.{}&start_time=lt.{}&end_time=gt.{}&order=start_time.asc",
            professional_id,
            ts(range.end),
            ts(range.start)
        );
        parse_rows(self.select(&path).await?)
    }
}

#[async_trait]
impl BookingStore for SupabaseStore {
    async fn get_booking(&self, booking_id: Uuid) -> StoreResult<Option<Booking>> {
        let path = format!("/rest/v1/bookings?id=eq.{}", booking_id);
        first_row(self.select(&path).await?)
    }

    async fn bookings_for_professional(&self, professional_id: Uuid, range: &TimeRange) -> StoreResult<Vec<Booking>> {
        let path = format!(
            "/rest/v1/bookings?professional_id=eq.{}&start_time=lt.{}&end_time=gt.{}&order=start_time.asc,created_at.asc",
            professional_id,
            ts(range.end),
            ts(range.start)
        );
        parse_rows(self.select(&path).await?)
    }

    async fn insert_if_free(&self, booking: &Booking) -> StoreResult<Booking> {
        debug!("Calling book_slot for professional {} at {}", booking.professional_id, booking.start_time);
        let rows: Vec<Value> = self
            .supabase
            .rpc("book_slot", json!({ "p_booking": booking }))
            .await?;
        first_row(rows)?.ok_or(StoreError::SlotTaken)
    }

    async fn move_if_free(&self, booking: &Booking, expected: BookingStatus) -> StoreResult<Option<Booking>> {
        debug!("Calling move_booking for booking {} to {}", booking.id, booking.start_time);
        let rows: Vec<Value> = self
            .supabase
            .rpc(
                "move_booking",
                json!({ "p_booking": booking, "p_expected_status": expected }),
            )
            .await?;
        first_row(rows)
    }

    async fn update_if_status(&self, booking: &Booking, expected: BookingStatus) -> StoreResult<Option<Booking>> {
        let path = format!("/rest/v1/bookings?id=eq.{}&status=eq.{}", booking.id, expected);
        let body = json!({
            "status": booking.status,
            "confirmed_at": booking.confirmed_at,
            "cancelled_at": booking.cancelled_at,
            "cancellation_reason": booking.cancellation_reason,
            "notes": booking.notes,
            "updated_at": booking.updated_at,
        });
        first_row(self.write(Method::PATCH, &path, body).await?)
    }
}

#[async_trait]
impl WaitlistStore for SupabaseStore {
    async fn insert_entry(&self, entry: &WaitlistEntry) -> StoreResult<WaitlistEntry> {
        let rows = self.write(Method::POST, "/rest/v1/waitlist_entries", serde_json::to_value(entry)?).await?;
        first_row(rows)?.ok_or_else(|| StoreError::Backend("Failed to create waitlist entry".to_string()))
    }

    async fn get_entry(&self, entry_id: Uuid) -> StoreResult<Option<WaitlistEntry>> {
        let path = format!("/rest/v1/waitlist_entries?id=eq.{}", entry_id);
        first_row(self.select(&path).await?)
    }

    async fn active_entries(&self, professional_id: Uuid, date: NaiveDate) -> StoreResult<Vec<WaitlistEntry>> {
        let path = format!(
            "/rest/v1/waitlist_entries?professional_id=eq.{}&preferred_date=eq.{}&status=eq.active&order=created_at.asc,id.asc",
            professional_id, date
        );
        parse_rows(self.select(&path).await?)
    }

    async fn entries_for_client(&self, client_id: Uuid) -> StoreResult<Vec<WaitlistEntry>> {
        let path = format!(
            "/rest/v1/waitlist_entries?client_id=eq.{}&order=created_at.asc",
            client_id
        );
        parse_rows(self.select(&path).await?)
    }

    async fn entries_for_professional(&self, professional_id: Uuid, date: Option<NaiveDate>) -> StoreResult<Vec<WaitlistEntry>> {
        let mut path = format!("/rest/v1/waitlist_entries?professional_id=eq.{}", professional_id);
        if let Some(date) = date {
            path.push_str(&format!("&preferred_date=eq.{}", date));
        }
        path.push_str("&order=created_at.asc");
        parse_rows(self.select(&path).await?)
    }

    async fn update_entry_if_status(&self, entry: &WaitlistEntry, expected: WaitlistStatus) -> StoreResult<Option<WaitlistEntry>> {
        let path = format!("/rest/v1/waitlist_entries?id=eq.{}&status=eq.{}", entry.id, expected);
        let body = json!({
            "status": entry.status,
            "notified_at": entry.notified_at,
            "updated_at": entry.updated_at,
        });
        first_row(self.write(Method::PATCH, &path, body).await?)
    }
}

#[async_trait]
impl ServiceCatalog for SupabaseStore {
    async fn duration_minutes(&self, service_id: Uuid) -> StoreResult<Option<i32>> {
        let path = format!("/rest/v1/services?id=eq.{}&select=duration_minutes", service_id);
        let rows = self.select(&path).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("duration_minutes"))
            .and_then(|d| d.as_i64())
            .map(|d| d as i32))
    }
}
