use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::{BlockedRange, ScheduleRule, Slot};
use shared_utils::extractor::require_participant;

use crate::models::{
    AvailabilityQuery, BlockRangeRequest, BlockedRangeQuery, CreateScheduleRuleRequest,
    UpdateScheduleRuleRequest,
};
use crate::router::AvailabilityState;

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<AvailabilityState>,
    Path(professional_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    debug!("Availability lookup for professional {} on {}", professional_id, query.date);

    let slots = state
        .engine
        .available_slots(professional_id, query.date, query.service_id)
        .await?;

    Ok(Json(slots))
}

// ==============================================================================
// SCHEDULE RULES
// ==============================================================================

pub async fn list_rules(
    State(state): State<AvailabilityState>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Vec<ScheduleRule>>, AppError> {
    Ok(Json(state.schedules.list_rules(professional_id).await?))
}

#[axum::debug_handler]
pub async fn create_rule(
    State(state): State<AvailabilityState>,
    Path(professional_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateScheduleRuleRequest>,
) -> Result<(StatusCode, Json<ScheduleRule>), AppError> {
    require_participant(&user, &[professional_id])?;

    let rule = state.schedules.create_rule(professional_id, request).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn update_rule(
    State(state): State<AvailabilityState>,
    Path(rule_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateScheduleRuleRequest>,
) -> Result<Json<ScheduleRule>, AppError> {
    let existing = state.schedules.get_rule(rule_id).await?;
    require_participant(&user, &[existing.professional_id])?;

    Ok(Json(state.schedules.update_rule(rule_id, request).await?))
}

// ==============================================================================
// BLOCKED RANGES
// ==============================================================================

pub async fn list_blocked_ranges(
    State(state): State<AvailabilityState>,
    Path(professional_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Query(query): Query<BlockedRangeQuery>,
) -> Result<Json<Vec<BlockedRange>>, AppError> {
    require_participant(&user, &[professional_id])?;

    let ranges = state
        .schedules
        .list_blocked_ranges(professional_id, query.from, query.to)
        .await?;
    Ok(Json(ranges))
}

pub async fn block_range(
    State(state): State<AvailabilityState>,
    Path(professional_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<BlockRangeRequest>,
) -> Result<(StatusCode, Json<BlockedRange>), AppError> {
    require_participant(&user, &[professional_id])?;

    let range = state.schedules.block_range(professional_id, request).await?;
    Ok((StatusCode::CREATED, Json(range)))
}

pub async fn unblock_range(
    State(state): State<AvailabilityState>,
    Path(range_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let range = state.schedules.get_blocked_range(range_id).await?;
    require_participant(&user, &[range.professional_id])?;

    state.schedules.unblock_range(range_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Blocked range removed"
    })))
}
