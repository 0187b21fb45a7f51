use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{ConflictStore, ScheduleStore};
use shared_models::{BlockedRange, ScheduleRule, TimeRange};
use shared_utils::clock::Clock;

use crate::models::{
    AvailabilityError, BlockRangeRequest, CreateScheduleRuleRequest, UpdateScheduleRuleRequest,
};

/// Professional-side management of the inputs to availability.
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    conflicts: Arc<dyn ConflictStore>,
    clock: Arc<dyn Clock>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>, conflicts: Arc<dyn ConflictStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, conflicts, clock }
    }

    /// Create a weekly rule for a professional.
    pub async fn create_rule(
        &self,
        professional_id: Uuid,
        request: CreateScheduleRuleRequest,
    ) -> Result<ScheduleRule, AvailabilityError> {
        debug!("Creating schedule rule for professional: {}", professional_id);

        let now = self.clock.now();
        let rule = ScheduleRule {
            id: Uuid::new_v4(),
            professional_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            slot_duration_minutes: request.slot_duration_minutes,
            buffer_minutes: request.buffer_minutes.unwrap_or(0),
            active: true,
            created_at: now,
            updated_at: now,
        };
        validate_rule(&rule)?;

        let created = self.store.insert_rule(&rule).await?;
        info!("Schedule rule {} created for professional {}", created.id, professional_id);
        Ok(created)
    }

    /// Partial update; `active = false` is the soft delete.
    pub async fn update_rule(
        &self,
        rule_id: Uuid,
        request: UpdateScheduleRuleRequest,
    ) -> Result<ScheduleRule, AvailabilityError> {
        debug!("Updating schedule rule: {}", rule_id);

        let mut rule = self.get_rule(rule_id).await?;

        if let Some(start_time) = request.start_time {
            rule.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            rule.end_time = end_time;
        }
        if let Some(duration) = request.slot_duration_minutes {
            rule.slot_duration_minutes = duration;
        }
        if let Some(buffer) = request.buffer_minutes {
            rule.buffer_minutes = buffer;
        }
        if let Some(active) = request.active {
            rule.active = active;
        }
        rule.updated_at = self.clock.now();

        validate_rule(&rule)?;
        Ok(self.store.update_rule(&rule).await?)
    }

    pub async fn get_rule(&self, rule_id: Uuid) -> Result<ScheduleRule, AvailabilityError> {
        self.store
            .get_rule(rule_id)
            .await?
            .ok_or_else(|| AvailabilityError::NotFound(format!("Schedule rule {}", rule_id)))
    }

    pub async fn list_rules(&self, professional_id: Uuid) -> Result<Vec<ScheduleRule>, AvailabilityError> {
        Ok(self.store.list_rules(professional_id).await?)
    }

    pub async fn block_range(
        &self,
        professional_id: Uuid,
        request: BlockRangeRequest,
    ) -> Result<BlockedRange, AvailabilityError> {
        if request.start_time >= request.end_time {
            return Err(AvailabilityError::Validation(
                "Blocked range must start before it ends".to_string(),
            ));
        }

        let range = BlockedRange {
            id: Uuid::new_v4(),
            professional_id,
            start_time: request.start_time,
            end_time: request.end_time,
            reason: request.reason,
            created_at: self.clock.now(),
        };

        let created = self.store.insert_blocked_range(&range).await?;
        info!(
            "Blocked {} - {} for professional {}",
            created.start_time, created.end_time, professional_id
        );
        Ok(created)
    }

    pub async fn list_blocked_ranges(
        &self,
        professional_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BlockedRange>, AvailabilityError> {
        if from >= to {
            return Err(AvailabilityError::Validation("`from` must be before `to`".to_string()));
        }
        Ok(self
            .conflicts
            .blocked_ranges_overlapping(professional_id, &TimeRange::new(from, to))
            .await?)
    }

    pub async fn get_blocked_range(&self, range_id: Uuid) -> Result<BlockedRange, AvailabilityError> {
        self.store
            .get_blocked_range(range_id)
            .await?
            .ok_or_else(|| AvailabilityError::NotFound(format!("Blocked range {}", range_id)))
    }

    pub async fn unblock_range(&self, range_id: Uuid) -> Result<(), AvailabilityError> {
        if self.store.delete_blocked_range(range_id).await? {
            info!("Blocked range {} removed", range_id);
            Ok(())
        } else {
            Err(AvailabilityError::NotFound(format!("Blocked range {}", range_id)))
        }
    }
}

const MINUTES_PER_DAY: i32 = 24 * 60;

fn validate_rule(rule: &ScheduleRule) -> Result<(), AvailabilityError> {
    if !(0..=6).contains(&rule.day_of_week) {
        return Err(AvailabilityError::Validation(
            "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
        ));
    }
    if rule.start_time >= rule.end_time {
        return Err(AvailabilityError::Validation("Start time must be before end time".to_string()));
    }
    if !(1..=MINUTES_PER_DAY).contains(&rule.slot_duration_minutes) {
        return Err(AvailabilityError::Validation(format!(
            "Slot duration must be between 1 and {} minutes",
            MINUTES_PER_DAY
        )));
    }
    if !(0..=MINUTES_PER_DAY).contains(&rule.buffer_minutes) {
        return Err(AvailabilityError::Validation(format!(
            "Buffer must be between 0 and {} minutes",
            MINUTES_PER_DAY
        )));
    }
    Ok(())
}
