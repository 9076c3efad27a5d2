use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{Appointment, AppointmentDraft, AppointmentFilter, Diagnosis};
use crate::error::AppResult;
use crate::scheduling::clock::{date_format, parse_clock};
use crate::scheduling::BookingReceipt;

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(with = "date_format")]
    pub date: Date,
    /// Accepts "10:00" as well as "10:00 AM".
    pub start_time: String,
    #[serde(flatten)]
    pub draft: AppointmentDraft,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: String,
}

/// Book a slot. 409 means the slot went away; re-fetch the schedule.
pub async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookAppointmentRequest>,
) -> AppResult<(StatusCode, Json<BookingReceipt>)> {
    let start = parse_clock(&request.start_time)?;
    let receipt = state
        .scheduler
        .book_slot(request.date, start, request.draft)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    Query(filter): Query<AppointmentFilter>,
) -> AppResult<Json<Vec<Appointment>>> {
    Ok(Json(state.scheduler.list_appointments(&filter).await?))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    Ok(Json(state.scheduler.get_appointment(id).await?))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.scheduler.delete_appointment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelRequest>,
) -> AppResult<Json<Appointment>> {
    Ok(Json(
        state.scheduler.cancel_appointment(id, &request.reason).await?,
    ))
}

pub async fn complete_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(diagnosis): Json<Diagnosis>,
) -> AppResult<Json<Appointment>> {
    Ok(Json(
        state.scheduler.complete_appointment(id, diagnosis).await?,
    ))
}

pub async fn update_diagnosis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(diagnosis): Json<Diagnosis>,
) -> AppResult<Json<Appointment>> {
    Ok(Json(state.scheduler.update_diagnosis(id, diagnosis).await?))
}
