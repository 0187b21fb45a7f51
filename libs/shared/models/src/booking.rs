use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::schedule::TimeRange;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub client_id: Uuid,
    pub pet_id: Uuid,
    pub service_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: BookingStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_via: CreatedVia,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn range(&self) -> TimeRange {
        TimeRange::starting_at(self.start_time, self.duration_minutes)
    }

    /// Whether this booking still occupies its interval.
    pub fn holds_slot(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub const NON_TERMINAL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Scheduled,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CreatedVia {
    Professional,
    Client,
    Admin,
}

impl CreatedVia {
    /// Client requests wait for the professional's confirmation; everyone else
    /// books straight into the schedule.
    pub fn initial_status(&self) -> BookingStatus {
        match self {
            CreatedVia::Client => BookingStatus::Pending,
            CreatedVia::Professional | CreatedVia::Admin => BookingStatus::Scheduled,
        }
    }
}
