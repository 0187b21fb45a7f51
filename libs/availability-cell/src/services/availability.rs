use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_database::{ConflictStore, ScheduleStore, ServiceCatalog};
use shared_models::schedule::day_of_week;
use shared_models::{ScheduleRule, Slot, TimeRange};

use crate::models::AvailabilityError;
use crate::services::slots::SlotGenerator;

/// A grid slot annotated with whether it can still be booked.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotCandidate {
    pub slot: Slot,
    pub is_available: bool,
}

/// Read-only query side of scheduling: combines the rule grid with bookings
/// and blocked ranges. Holds no mutable state, so it can be shared freely.
pub struct AvailabilityEngine {
    schedules: Arc<dyn ScheduleStore>,
    conflicts: Arc<dyn ConflictStore>,
    services: Arc<dyn ServiceCatalog>,
    default_duration_minutes: i32,
}

impl AvailabilityEngine {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        conflicts: Arc<dyn ConflictStore>,
        services: Arc<dyn ServiceCatalog>,
        default_duration_minutes: i32,
    ) -> Self {
        Self {
            schedules,
            conflicts,
            services,
            default_duration_minutes,
        }
    }

    /// Service duration, or the configured default when no service is given.
    pub async fn resolve_duration(&self, service_id: Option<Uuid>) -> Result<i32, AvailabilityError> {
        match service_id {
            None => Ok(self.default_duration_minutes),
            Some(id) => self
                .services
                .duration_minutes(id)
                .await?
                .ok_or_else(|| AvailabilityError::NotFound(format!("Service {}", id))),
        }
    }

    /// The rule consulted for `date`. With duplicates for the same weekday the
    /// most recently updated active rule wins.
    pub async fn active_rule(&self, professional_id: Uuid, date: NaiveDate) -> Result<Option<ScheduleRule>, AvailabilityError> {
        let rules = self.schedules.rules_for_day(professional_id, day_of_week(date)).await?;

        Ok(rules
            .into_iter()
            .filter(|r| r.applies_to(date))
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id))))
    }

    /// Bookable slots for a professional on `date`, ascending.
    #[instrument(skip(self))]
    pub async fn available_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        service_id: Option<Uuid>,
    ) -> Result<Vec<Slot>, AvailabilityError> {
        self.available_slots_excluding(professional_id, date, service_id, None).await
    }

    /// Same as [`available_slots`](Self::available_slots) but ignoring one
    /// booking, so a booking being moved does not block itself.
    pub async fn available_slots_excluding(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        service_id: Option<Uuid>,
        exclude_booking: Option<Uuid>,
    ) -> Result<Vec<Slot>, AvailabilityError> {
        let candidates = self
            .evaluate_slots(professional_id, date, service_id, exclude_booking)
            .await?;

        let slots: Vec<Slot> = candidates
            .into_iter()
            .filter(|c| c.is_available)
            .map(|c| c.slot)
            .collect();

        debug!("Found {} available slots for professional {} on {}", slots.len(), professional_id, date);
        Ok(slots)
    }

    /// Whether `start` is exactly one of the bookable slot starts.
    pub async fn is_slot_available(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        service_id: Option<Uuid>,
        exclude_booking: Option<Uuid>,
    ) -> Result<bool, AvailabilityError> {
        let duration = self.resolve_duration(service_id).await?;
        self.is_start_available(professional_id, start, duration, exclude_booking)
            .await
    }

    /// Like [`is_slot_available`](Self::is_slot_available) for a grid laid
    /// out with an explicit duration.
    pub async fn is_start_available(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i32,
        exclude_booking: Option<Uuid>,
    ) -> Result<bool, AvailabilityError> {
        let candidates = self
            .evaluate_grid(professional_id, start.date_naive(), duration_minutes, exclude_booking)
            .await?;
        Ok(candidates.iter().any(|c| c.is_available && c.slot.start == start))
    }

    /// Whether any blocked range of the professional intersects `range`.
    pub async fn is_blocked(&self, professional_id: Uuid, range: &TimeRange) -> Result<bool, AvailabilityError> {
        let blocks = self.conflicts.blocked_ranges_overlapping(professional_id, range).await?;
        Ok(!blocks.is_empty())
    }

    /// Every grid slot for the date with its availability flag.
    pub async fn evaluate_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        service_id: Option<Uuid>,
        exclude_booking: Option<Uuid>,
    ) -> Result<Vec<SlotCandidate>, AvailabilityError> {
        let duration = self.resolve_duration(service_id).await?;
        self.evaluate_grid(professional_id, date, duration, exclude_booking)
            .await
    }

    async fn evaluate_grid(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        duration_minutes: i32,
        exclude_booking: Option<Uuid>,
    ) -> Result<Vec<SlotCandidate>, AvailabilityError> {
        let rule = match self.active_rule(professional_id, date).await? {
            Some(rule) => rule,
            None => {
                debug!("No active schedule rule for professional {} on {}", professional_id, date);
                return Ok(vec![]);
            }
        };

        let grid = SlotGenerator::generate(&rule, date, duration_minutes);

        let day = TimeRange::day(date);
        let booked: Vec<TimeRange> = self
            .conflicts
            .bookings_overlapping(professional_id, &day)
            .await?
            .into_iter()
            .filter(|b| Some(b.id) != exclude_booking && b.holds_slot())
            .map(|b| b.range())
            .collect();
        let blocked: Vec<TimeRange> = self
            .conflicts
            .blocked_ranges_overlapping(professional_id, &day)
            .await?
            .iter()
            .map(|r| r.range())
            .collect();

        Ok(grid
            .map(|slot| {
                let taken = booked.iter().chain(blocked.iter()).any(|other| slot.overlaps(other));
                SlotCandidate {
                    slot,
                    is_available: !taken,
                }
            })
            .collect())
    }
}
