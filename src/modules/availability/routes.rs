use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    adjust_slot, clear_unavailability, day_schedule, delete_unavailability_slot,
    limit_slot, list_unavailability, mark_unavailable, slot_status,
};
use crate::app_state::AppState;

pub fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/{date}", get(day_schedule))
        .route("/{date}/slots/{time}", get(slot_status))
}

pub fn unavailability_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(mark_unavailable))
        .route("/limit", post(limit_slot))
        .route(
            "/date/{date}",
            get(list_unavailability).delete(clear_unavailability),
        )
        .route(
            "/{id}",
            patch(adjust_slot).delete(delete_unavailability_slot),
        )
}
