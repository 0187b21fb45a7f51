use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use availability_cell::services::AvailabilityEngine;
use shared_database::{BookingStore, StoreError};
use shared_models::{Booking, BookingStatus, CreatedVia, Slot, TimeRange};
use shared_utils::clock::Clock;
use waitlist_cell::services::WaitlistManager;

use crate::models::{BookingError, CreateBookingRequest};
use crate::services::lifecycle::validate_transition;

/// Owns every booking mutation. Writes go through the store's atomic
/// primitives, so a concurrent writer on the same slot loses with
/// `SlotUnavailable` instead of producing an overlap.
pub struct BookingEngine {
    availability: Arc<AvailabilityEngine>,
    bookings: Arc<dyn BookingStore>,
    waitlist: Arc<WaitlistManager>,
    clock: Arc<dyn Clock>,
}

impl BookingEngine {
    pub fn new(
        availability: Arc<AvailabilityEngine>,
        bookings: Arc<dyn BookingStore>,
        waitlist: Arc<WaitlistManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            availability,
            bookings,
            waitlist,
            clock,
        }
    }

    /// Book `request.start_time` for `client_id`.
    #[instrument(skip(self, request), fields(professional_id = %request.professional_id, start = %request.start_time))]
    pub async fn create(
        &self,
        client_id: Uuid,
        request: CreateBookingRequest,
        created_via: CreatedVia,
    ) -> Result<Booking, BookingError> {
        let now = self.clock.now();
        if request.start_time < now {
            return Err(BookingError::InPast);
        }

        let duration = self.availability.resolve_duration(request.service_id).await?;
        self.ensure_bookable(request.professional_id, request.start_time, duration, None)
            .await?;

        let booking = Booking {
            id: Uuid::new_v4(),
            professional_id: request.professional_id,
            client_id,
            pet_id: request.pet_id,
            service_id: request.service_id,
            start_time: request.start_time,
            duration_minutes: duration,
            status: created_via.initial_status(),
            confirmed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            created_via,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        let created = self.bookings.insert_if_free(&booking).await?;
        info!("Booking {} created as {}", created.id, created.status);
        Ok(created)
    }

    /// `pending -> scheduled`, stamping `confirmed_at`.
    pub async fn confirm(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let current = self.get(booking_id).await?;
        validate_transition(current.status, BookingStatus::Scheduled)?;

        let now = self.clock.now();
        let expected = current.status;
        let confirmed = Booking {
            status: BookingStatus::Scheduled,
            confirmed_at: Some(now),
            updated_at: now,
            ..current
        };

        let saved = self.write_if_status(confirmed, expected).await?;
        info!("Booking {} confirmed", saved.id);
        Ok(saved)
    }

    /// Cancel from any live status and offer the freed interval to the waitlist.
    #[instrument(skip(self, reason))]
    pub async fn cancel(&self, booking_id: Uuid, reason: Option<String>) -> Result<Booking, BookingError> {
        let current = self.get(booking_id).await?;
        if current.status.is_terminal() {
            return Err(BookingError::InvalidState(current.status));
        }

        let saved = self.cancel_from(current, reason).await?;
        self.release(saved.range(), saved.professional_id).await;
        Ok(saved)
    }

    /// Move a live booking to `new_start`, keeping its booked duration. The
    /// booking goes back to `pending` and must be confirmed again.
    #[instrument(skip(self))]
    pub async fn reschedule(&self, booking_id: Uuid, new_start: DateTime<Utc>) -> Result<Booking, BookingError> {
        let now = self.clock.now();
        if new_start < now {
            return Err(BookingError::PastDate);
        }

        let current = self.get(booking_id).await?;
        if current.status.is_terminal() {
            return Err(BookingError::InvalidState(current.status));
        }

        self.ensure_bookable(current.professional_id, new_start, current.duration_minutes, Some(current.id))
            .await?;

        let previous = current.range();
        let expected = current.status;
        let moved = Booking {
            start_time: new_start,
            status: BookingStatus::Pending,
            confirmed_at: None,
            updated_at: now,
            ..current
        };

        let saved = match self.bookings.move_if_free(&moved, expected).await? {
            Some(saved) => saved,
            None => return Err(self.changed_underneath(booking_id).await),
        };
        info!("Booking {} moved from {} to {}", saved.id, previous.start, saved.start_time);

        if !previous.overlaps(&saved.range()) {
            self.release(previous, saved.professional_id).await;
        }
        Ok(saved)
    }

    /// Advance along the status table. Cancellation routed through here
    /// behaves exactly like [`cancel`](Self::cancel) without a reason.
    pub async fn transition(&self, booking_id: Uuid, target: BookingStatus) -> Result<Booking, BookingError> {
        match target {
            BookingStatus::Scheduled => return self.confirm(booking_id).await,
            BookingStatus::Cancelled => {
                let current = self.get(booking_id).await?;
                validate_transition(current.status, target)?;
                let saved = self.cancel_from(current, None).await?;
                self.release(saved.range(), saved.professional_id).await;
                return Ok(saved);
            }
            _ => {}
        }

        let current = self.get(booking_id).await?;
        validate_transition(current.status, target)?;

        let expected = current.status;
        let advanced = Booking {
            status: target,
            updated_at: self.clock.now(),
            ..current
        };

        let saved = self.write_if_status(advanced, expected).await?;
        info!("Booking {} moved {} -> {}", saved.id, expected, saved.status);
        Ok(saved)
    }

    pub async fn get(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Booking {}", booking_id)))
    }

    /// Every booking of the professional on `date`, any status.
    pub async fn list_for_professional(&self, professional_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        Ok(self
            .bookings
            .bookings_for_professional(professional_id, &TimeRange::day(date))
            .await?)
    }

    async fn ensure_bookable(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i32,
        exclude: Option<Uuid>,
    ) -> Result<(), BookingError> {
        let available = self
            .availability
            .is_start_available(professional_id, start, duration_minutes, exclude)
            .await?;

        if available {
            Ok(())
        } else {
            debug!("Slot {} is not on the open grid for professional {}", start, professional_id);
            Err(BookingError::SlotUnavailable)
        }
    }

    async fn cancel_from(&self, current: Booking, reason: Option<String>) -> Result<Booking, BookingError> {
        let now = self.clock.now();
        let expected = current.status;
        let cancelled = Booking {
            status: BookingStatus::Cancelled,
            cancelled_at: Some(now),
            cancellation_reason: reason,
            updated_at: now,
            ..current
        };

        let saved = self.write_if_status(cancelled, expected).await?;
        info!("Booking {} cancelled", saved.id);
        Ok(saved)
    }

    async fn write_if_status(&self, booking: Booking, expected: BookingStatus) -> Result<Booking, BookingError> {
        match self.bookings.update_if_status(&booking, expected).await {
            Ok(Some(saved)) => Ok(saved),
            Ok(None) => Err(self.changed_underneath(booking.id).await),
            Err(StoreError::SlotTaken) => Err(BookingError::SlotUnavailable),
            Err(e) => Err(e.into()),
        }
    }

    async fn changed_underneath(&self, booking_id: Uuid) -> BookingError {
        match self.get(booking_id).await {
            Ok(latest) => {
                warn!("Booking {} changed concurrently, now {}", booking_id, latest.status);
                BookingError::InvalidState(latest.status)
            }
            Err(e) => e,
        }
    }

    /// Offer a freed interval to the waitlist unless it has already started or
    /// is blocked. Never fails the booking operation that freed it.
    async fn release(&self, slot: Slot, professional_id: Uuid) {
        if slot.start < self.clock.now() {
            debug!("Freed slot {} already started, not offered to the waitlist", slot.start);
            return;
        }

        match self.availability.is_blocked(professional_id, &slot).await {
            Ok(false) => {}
            Ok(true) => {
                debug!("Freed slot {} is blocked, not offered to the waitlist", slot.start);
                return;
            }
            Err(e) => {
                warn!("Blocked range lookup failed for professional {}: {}", professional_id, e);
                return;
            }
        }

        if let Err(e) = self.waitlist.on_slot_freed(professional_id, slot).await {
            warn!("Waitlist evaluation failed for professional {}: {}", professional_id, e);
        }
    }
}
