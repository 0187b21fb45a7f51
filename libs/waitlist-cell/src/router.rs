use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::WaitlistManager;

#[derive(Clone)]
pub struct WaitlistState {
    pub manager: Arc<WaitlistManager>,
}

pub fn waitlist_routes(config: Arc<AppConfig>, manager: Arc<WaitlistManager>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::add_entry))
        .route("/{entry_id}", get(handlers::get_entry))
        .route("/{entry_id}/booked", post(handlers::mark_booked))
        .route("/{entry_id}/cancel", post(handlers::cancel_entry))
        .route("/client/{client_id}", get(handlers::list_client_entries))
        .route("/professional/{professional_id}", get(handlers::list_professional_entries))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(WaitlistState { manager })
}
