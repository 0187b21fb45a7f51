use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{AvailabilityEngine, ScheduleService};

#[derive(Clone)]
pub struct AvailabilityState {
    pub engine: Arc<AvailabilityEngine>,
    pub schedules: Arc<ScheduleService>,
}

pub fn availability_routes(
    config: Arc<AppConfig>,
    engine: Arc<AvailabilityEngine>,
    schedules: Arc<ScheduleService>,
) -> Router {
    let state = AvailabilityState { engine, schedules };

    let protected_routes = Router::new()
        .route("/{professional_id}", get(handlers::get_available_slots))
        .route(
            "/{professional_id}/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route("/rules/{rule_id}", patch(handlers::update_rule))
        .route(
            "/{professional_id}/blocks",
            get(handlers::list_blocked_ranges).post(handlers::block_range),
        )
        .route("/blocks/{block_id}", delete(handlers::unblock_range))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
