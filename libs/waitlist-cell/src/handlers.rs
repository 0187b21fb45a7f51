use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::WaitlistEntry;
use shared_utils::extractor::{require_participant, user_uuid};

use crate::models::{AddWaitlistEntryRequest, WaitlistDateQuery};
use crate::router::WaitlistState;

#[axum::debug_handler]
pub async fn add_entry(
    State(state): State<WaitlistState>,
    Extension(user): Extension<User>,
    Json(request): Json<AddWaitlistEntryRequest>,
) -> Result<(StatusCode, Json<WaitlistEntry>), AppError> {
    let client_id = match request.client_id {
        Some(id) => id,
        None => user_uuid(&user)?,
    };
    require_participant(&user, &[client_id])?;

    let entry = state.manager.add(client_id, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_entry(
    State(state): State<WaitlistState>,
    Path(entry_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<WaitlistEntry>, AppError> {
    let entry = state.manager.get(entry_id).await?;
    require_participant(&user, &[entry.client_id, entry.professional_id])?;

    Ok(Json(entry))
}

pub async fn list_client_entries(
    State(state): State<WaitlistState>,
    Path(client_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<WaitlistEntry>>, AppError> {
    require_participant(&user, &[client_id])?;

    Ok(Json(state.manager.list_for_client(client_id).await?))
}

pub async fn list_professional_entries(
    State(state): State<WaitlistState>,
    Path(professional_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Query(query): Query<WaitlistDateQuery>,
) -> Result<Json<Vec<WaitlistEntry>>, AppError> {
    require_participant(&user, &[professional_id])?;

    Ok(Json(state.manager.list_for_professional(professional_id, query.date).await?))
}

pub async fn mark_booked(
    State(state): State<WaitlistState>,
    Path(entry_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<WaitlistEntry>, AppError> {
    let entry = state.manager.get(entry_id).await?;
    require_participant(&user, &[entry.client_id, entry.professional_id])?;

    Ok(Json(state.manager.mark_booked(entry_id).await?))
}

pub async fn cancel_entry(
    State(state): State<WaitlistState>,
    Path(entry_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<WaitlistEntry>, AppError> {
    let entry = state.manager.get(entry_id).await?;
    require_participant(&user, &[entry.client_id, entry.professional_id])?;

    Ok(Json(state.manager.cancel(entry_id).await?))
}
