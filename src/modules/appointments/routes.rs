use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    book_appointment, cancel_appointment, complete_appointment, delete_appointment,
    get_appointment, list_appointments, update_diagnosis,
};
use crate::app_state::AppState;

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(book_appointment))
        .route("/{id}", get(get_appointment).delete(delete_appointment))
        .route("/{id}/cancel", post(cancel_appointment))
        .route("/{id}/complete", post(complete_appointment))
        .route("/{id}/diagnosis", put(update_diagnosis))
}
