use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use availability_cell::models::AvailabilityError;
use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::BookingStatus;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub professional_id: Uuid,
    /// Defaults to the caller.
    pub client_id: Option<Uuid>,
    pub pet_id: Uuid,
    pub service_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleBookingRequest {
    pub new_start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransitionRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfessionalBookingsQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Requested start time is in the past")]
    InPast,

    #[error("New start time is in the past")]
    PastDate,

    #[error("Requested slot is not available")]
    SlotUnavailable,

    #[error("Booking cannot be changed while {0}")]
    InvalidState(BookingStatus),

    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotTaken => BookingError::SlotUnavailable,
            StoreError::NotFound(what) => BookingError::NotFound(what),
            StoreError::Backend(msg) => BookingError::Internal(msg),
        }
    }
}

impl From<AvailabilityError> for BookingError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::NotFound(what) => BookingError::NotFound(what),
            AvailabilityError::Validation(msg) => BookingError::Validation(msg),
            AvailabilityError::Store(e) => e.into(),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InPast | BookingError::PastDate => AppError::BadRequest(err.to_string()),
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::SlotUnavailable
            | BookingError::InvalidState(_)
            | BookingError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            BookingError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            BookingError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
