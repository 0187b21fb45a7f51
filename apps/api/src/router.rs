use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use availability_cell::router::availability_routes;
use availability_cell::services::{AvailabilityEngine, ScheduleService};
use booking_cell::router::booking_routes;
use booking_cell::services::BookingEngine;
use shared_config::{AppConfig, StorageBackend};
use shared_database::{
    BookingStore, ConflictStore, MemoryStore, ScheduleStore, ServiceCatalog, SupabaseStore, WaitlistStore,
};
use shared_utils::clock::{Clock, SystemClock};
use waitlist_cell::router::waitlist_routes;
use waitlist_cell::services::{LogNotifier, Notifier, SupabaseNotifier, WaitlistManager};

/// Engines shared by every request, wired for the configured backend.
pub struct AppServices {
    pub availability: Arc<AvailabilityEngine>,
    pub schedules: Arc<ScheduleService>,
    pub bookings: Arc<BookingEngine>,
    pub waitlist: Arc<WaitlistManager>,
}

struct Ports {
    schedules: Arc<dyn ScheduleStore>,
    conflicts: Arc<dyn ConflictStore>,
    bookings: Arc<dyn BookingStore>,
    waitlist: Arc<dyn WaitlistStore>,
    services: Arc<dyn ServiceCatalog>,
    notifier: Arc<dyn Notifier>,
}

impl Ports {
    fn from_store<S>(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self
    where
        S: ScheduleStore + ConflictStore + BookingStore + WaitlistStore + ServiceCatalog + 'static,
    {
        Self {
            schedules: store.clone(),
            conflicts: store.clone(),
            bookings: store.clone(),
            waitlist: store.clone(),
            services: store,
            notifier,
        }
    }
}

impl AppServices {
    pub fn build(config: &AppConfig) -> Self {
        let ports = match config.storage_backend {
            StorageBackend::Supabase => Ports::from_store(
                Arc::new(SupabaseStore::new(config)),
                Arc::new(SupabaseNotifier::new(config)),
            ),
            StorageBackend::Memory => Ports::from_store(Arc::new(MemoryStore::new()), Arc::new(LogNotifier)),
        };

        Self::with_ports(config, ports, Arc::new(SystemClock))
    }

    fn with_ports(config: &AppConfig, ports: Ports, clock: Arc<dyn Clock>) -> Self {
        let availability = Arc::new(AvailabilityEngine::new(
            ports.schedules.clone(),
            ports.conflicts.clone(),
            ports.services,
            config.default_service_duration_minutes,
        ));
        let schedules = Arc::new(ScheduleService::new(ports.schedules, ports.conflicts, clock.clone()));
        let waitlist = Arc::new(WaitlistManager::new(ports.waitlist, ports.notifier, clock.clone()));
        let bookings = Arc::new(BookingEngine::new(
            availability.clone(),
            ports.bookings,
            waitlist.clone(),
            clock,
        ));

        Self {
            availability,
            schedules,
            bookings,
            waitlist,
        }
    }
}

pub fn create_router(config: Arc<AppConfig>, services: AppServices) -> Router {
    Router::new()
        .route("/", get(|| async { "Scheduling API is running!" }))
        .nest(
            "/availability",
            availability_routes(config.clone(), services.availability, services.schedules),
        )
        .nest("/bookings", booking_routes(config.clone(), services.bookings))
        .nest("/waitlist", waitlist_routes(config, services.waitlist))
}
