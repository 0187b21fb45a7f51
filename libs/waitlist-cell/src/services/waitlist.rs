use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::WaitlistStore;
use shared_models::{Slot, WaitlistEntry, WaitlistStatus};
use shared_utils::clock::Clock;

use crate::models::{AddWaitlistEntryRequest, WaitlistError};
use crate::services::notification::{Notifier, SLOT_AVAILABLE_EVENT};

pub struct WaitlistManager {
    store: Arc<dyn WaitlistStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl WaitlistManager {
    pub fn new(store: Arc<dyn WaitlistStore>, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self { store, notifier, clock }
    }

    /// Record speculative demand. No slot validation happens here.
    pub async fn add(&self, client_id: Uuid, request: AddWaitlistEntryRequest) -> Result<WaitlistEntry, WaitlistError> {
        let now = self.clock.now();
        let entry = WaitlistEntry {
            id: Uuid::new_v4(),
            professional_id: request.professional_id,
            client_id,
            service_id: request.service_id,
            pet_id: request.pet_id,
            preferred_date: request.preferred_date,
            preferred_time: request.preferred_time,
            status: WaitlistStatus::Active,
            notes: request.notes,
            notified_at: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_entry(&entry).await?;
        info!(
            "Client {} waitlisted for professional {} on {}",
            client_id, created.professional_id, created.preferred_date
        );
        Ok(created)
    }

    /// Notify the oldest active entry matching `slot`, if any.
    ///
    /// Entries claimed concurrently by another caller are skipped, so each
    /// freed slot promotes at most one entry.
    #[instrument(skip(self))]
    pub async fn on_slot_freed(&self, professional_id: Uuid, slot: Slot) -> Result<Option<WaitlistEntry>, WaitlistError> {
        let candidates = self
            .store
            .active_entries(professional_id, slot.start.date_naive())
            .await?;

        for entry in candidates.into_iter().filter(|e| e.matches_slot(&slot)) {
            let now = self.clock.now();
            let notified = WaitlistEntry {
                status: WaitlistStatus::Notified,
                notified_at: Some(now),
                updated_at: now,
                ..entry
            };

            match self.store.update_entry_if_status(&notified, WaitlistStatus::Active).await? {
                Some(updated) => {
                    info!("Waitlist entry {} notified of freed slot {}", updated.id, slot.start);
                    self.dispatch(&updated, slot);
                    return Ok(Some(updated));
                }
                None => debug!("Waitlist entry {} changed underneath, trying next", notified.id),
            }
        }

        debug!("No waitlist entry matched freed slot {}", slot.start);
        Ok(None)
    }

    pub async fn mark_booked(&self, entry_id: Uuid) -> Result<WaitlistEntry, WaitlistError> {
        self.close(entry_id, WaitlistStatus::Booked).await
    }

    pub async fn cancel(&self, entry_id: Uuid) -> Result<WaitlistEntry, WaitlistError> {
        self.close(entry_id, WaitlistStatus::Cancelled).await
    }

    pub async fn get(&self, entry_id: Uuid) -> Result<WaitlistEntry, WaitlistError> {
        self.store
            .get_entry(entry_id)
            .await?
            .ok_or(WaitlistError::NotFound(entry_id))
    }

    pub async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        Ok(self.store.entries_for_client(client_id).await?)
    }

    pub async fn list_for_professional(
        &self,
        professional_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        Ok(self.store.entries_for_professional(professional_id, date).await?)
    }

    async fn close(&self, entry_id: Uuid, target: WaitlistStatus) -> Result<WaitlistEntry, WaitlistError> {
        let current = self.get(entry_id).await?;
        if !current.status.is_open() {
            return Err(WaitlistError::InvalidState(current.status));
        }

        let expected = current.status;
        let closed = WaitlistEntry {
            status: target,
            updated_at: self.clock.now(),
            ..current
        };

        match self.store.update_entry_if_status(&closed, expected).await? {
            Some(updated) => {
                info!("Waitlist entry {} is now {}", entry_id, target);
                Ok(updated)
            }
            None => {
                let latest = self.get(entry_id).await?;
                Err(WaitlistError::InvalidState(latest.status))
            }
        }
    }

    fn dispatch(&self, entry: &WaitlistEntry, slot: Slot) {
        let notifier = self.notifier.clone();
        let client_id = entry.client_id;
        let payload = json!({
            "entry_id": entry.id,
            "professional_id": entry.professional_id,
            "service_id": entry.service_id,
            "slot_start": slot.start,
            "slot_end": slot.end,
        });

        tokio::spawn(async move {
            if let Err(e) = notifier.notify(client_id, SLOT_AVAILABLE_EVENT, payload).await {
                warn!("Failed to notify client {} of freed slot: {}", client_id, e);
            }
        });
    }
}
