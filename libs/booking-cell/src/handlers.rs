use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::Booking;
use shared_utils::extractor::{require_participant, user_uuid};

use crate::models::{
    CancelBookingRequest, CreateBookingRequest, ProfessionalBookingsQuery, RescheduleBookingRequest,
    StatusTransitionRequest,
};
use crate::router::BookingState;

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<BookingState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let client_id = match request.client_id {
        Some(id) => id,
        None => user_uuid(&user)?,
    };
    require_participant(&user, &[client_id, request.professional_id])?;

    let created_via = user.booking_origin(request.professional_id);
    debug!("Booking requested by {} as {:?}", user.id, created_via);

    let booking = state.engine.create(client_id, request, created_via).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(
    State(state): State<BookingState>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.get(booking_id).await?;
    require_participant(&user, &[booking.client_id, booking.professional_id])?;

    Ok(Json(booking))
}

pub async fn list_professional_bookings(
    State(state): State<BookingState>,
    Path(professional_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Query(query): Query<ProfessionalBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    require_participant(&user, &[professional_id])?;

    Ok(Json(state.engine.list_for_professional(professional_id, query.date).await?))
}

pub async fn confirm_booking(
    State(state): State<BookingState>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.get(booking_id).await?;
    require_participant(&user, &[booking.professional_id])?;

    Ok(Json(state.engine.confirm(booking_id).await?))
}

pub async fn cancel_booking(
    State(state): State<BookingState>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.get(booking_id).await?;
    require_participant(&user, &[booking.client_id, booking.professional_id])?;

    Ok(Json(state.engine.cancel(booking_id, request.reason).await?))
}

pub async fn reschedule_booking(
    State(state): State<BookingState>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<RescheduleBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.get(booking_id).await?;
    require_participant(&user, &[booking.client_id, booking.professional_id])?;

    Ok(Json(state.engine.reschedule(booking_id, request.new_start_time).await?))
}

pub async fn transition_booking(
    State(state): State<BookingState>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<StatusTransitionRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.get(booking_id).await?;
    require_participant(&user, &[booking.professional_id])?;

    Ok(Json(state.engine.transition(booking_id, request.status).await?))
}
