use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::WaitlistStatus;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWaitlistEntryRequest {
    pub professional_id: Uuid,
    /// Defaults to the caller.
    pub client_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub pet_id: Uuid,
    pub preferred_date: NaiveDate,
    pub preferred_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaitlistDateQuery {
    pub date: Option<NaiveDate>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum WaitlistError {
    #[error("Waitlist entry {0} not found")]
    NotFound(Uuid),

    #[error("Waitlist entry is {0} and can no longer change")]
    InvalidState(WaitlistStatus),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<WaitlistError> for AppError {
    fn from(err: WaitlistError) -> Self {
        match err {
            WaitlistError::NotFound(id) => AppError::NotFound(format!("Waitlist entry {} not found", id)),
            WaitlistError::InvalidState(_) => AppError::Conflict(err.to_string()),
            WaitlistError::Store(StoreError::NotFound(what)) => AppError::NotFound(format!("{} not found", what)),
            WaitlistError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
