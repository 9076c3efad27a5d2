use axum::{routing::get, Router};

use super::handlers::{create_medicine, get_medicine, list_medicines};
use crate::app_state::AppState;

pub fn medicine_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_medicines).post(create_medicine))
        .route("/{id}", get(get_medicine))
}
