pub mod booking;
pub mod lifecycle;

pub use booking::BookingEngine;
pub use lifecycle::{allowed_transitions, validate_transition};
