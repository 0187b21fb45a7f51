pub mod slots;
pub mod availability;
pub mod schedule;

pub use slots::{SlotGenerator, SlotIter};
pub use availability::{AvailabilityEngine, SlotCandidate};
pub use schedule::ScheduleService;
