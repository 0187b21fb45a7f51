pub mod auth;
pub mod error;
pub mod schedule;
pub mod booking;
pub mod waitlist;

pub use schedule::{BlockedRange, ScheduleRule, Slot, TimeRange};
pub use booking::{Booking, BookingStatus, CreatedVia};
pub use waitlist::{WaitlistEntry, WaitlistStatus};
