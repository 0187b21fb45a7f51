use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::schedule::Slot;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Option<Uuid>,
    pub pet_id: Uuid,
    pub preferred_date: NaiveDate,
    pub preferred_time: Option<NaiveTime>,
    pub status: WaitlistStatus,
    pub notes: Option<String>,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// An entry matches a freed slot on its preferred date; with a preferred
    /// time, that time must fall inside the slot.
    pub fn matches_slot(&self, slot: &Slot) -> bool {
        if self.preferred_date != slot.start.date_naive() {
            return false;
        }

        match self.preferred_time {
            None => true,
            Some(time) => {
                let preferred = self.preferred_date.and_time(time).and_utc();
                slot.start <= preferred && preferred < slot.end
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    Active,
    Notified,
    Booked,
    Cancelled,
}

impl WaitlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::Active => "active",
            WaitlistStatus::Notified => "notified",
            WaitlistStatus::Booked => "booked",
            WaitlistStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, WaitlistStatus::Active | WaitlistStatus::Notified)
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::TimeRange;
    use chrono::TimeZone;

    fn entry(date: NaiveDate, time: Option<NaiveTime>) -> WaitlistEntry {
        WaitlistEntry {
            id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            service_id: None,
            pet_id: Uuid::new_v4(),
            preferred_date: date,
            preferred_time: time,
            status: WaitlistStatus::Active,
            notes: None,
            notified_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_matches_slot_by_date_and_time() {
        let date = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let slot = TimeRange::new(
            Utc.with_ymd_and_hms(2026, 11, 2, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 11, 2, 10, 30, 0).unwrap(),
        );

        assert!(entry(date, None).matches_slot(&slot));
        assert!(entry(date, NaiveTime::from_hms_opt(10, 15, 0)).matches_slot(&slot));
        assert!(!entry(date, NaiveTime::from_hms_opt(10, 30, 0)).matches_slot(&slot));
        assert!(!entry(date.succ_opt().unwrap(), None).matches_slot(&slot));
    }
}
