pub mod appointments;
pub mod availability;
pub mod inventory;

use axum::Router;

use crate::app_state::AppState;

/// Everything mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/schedule", availability::routes::schedule_routes())
        .nest("/unavailability", availability::routes::unavailability_routes())
        .nest("/appointments", appointments::routes::appointment_routes())
        .nest("/medicines", inventory::routes::medicine_routes())
}
