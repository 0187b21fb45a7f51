use tracing::{debug, warn};

use shared_models::BookingStatus;

use crate::models::BookingError;

/// Statuses reachable in one step from `current`. Terminal statuses have none.
pub fn allowed_transitions(current: BookingStatus) -> &'static [BookingStatus] {
    use BookingStatus::*;

    match current {
        Pending => &[Scheduled, Cancelled, NoShow],
        Scheduled => &[Confirmed, Cancelled, NoShow],
        Confirmed => &[InProgress, Cancelled, NoShow],
        InProgress => &[Completed, Cancelled, NoShow],
        Completed | Cancelled | NoShow => &[],
    }
}

pub fn validate_transition(current: BookingStatus, target: BookingStatus) -> Result<(), BookingError> {
    debug!("Validating status transition from {} to {}", current, target);

    if !allowed_transitions(current).contains(&target) {
        warn!("Invalid status transition attempted: {} -> {}", current, target);
        return Err(BookingError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    Ok(())
}
