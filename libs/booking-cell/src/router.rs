use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::BookingEngine;

#[derive(Clone)]
pub struct BookingState {
    pub engine: Arc<BookingEngine>,
}

pub fn booking_routes(config: Arc<AppConfig>, engine: Arc<BookingEngine>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_booking))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/confirm", post(handlers::confirm_booking))
        .route("/{booking_id}/cancel", post(handlers::cancel_booking))
        .route("/{booking_id}/reschedule", post(handlers::reschedule_booking))
        .route("/{booking_id}/status", post(handlers::transition_booking))
        .route("/professional/{professional_id}", get(handlers::list_professional_bookings))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(BookingState { engine })
}
