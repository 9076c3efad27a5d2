use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use time::Date;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{SlotAdjustment, UnavailabilityRecord};
use crate::error::{AppError, AppResult};
use crate::scheduling::clock::{clock_format, date_format, parse_clock, parse_date};
use crate::scheduling::{DaySchedule, SlotState};

#[derive(Debug, Serialize)]
pub struct SlotStatusResponse {
    #[serde(with = "date_format")]
    pub date: Date,
    #[serde(with = "clock_format")]
    pub start: time::Time,
    pub available: bool,
    #[serde(flatten)]
    pub state: SlotState,
}

#[derive(Debug, Deserialize)]
pub struct MarkUnavailableRequest {
    #[serde(with = "date_format")]
    pub date: Date,
    pub slots: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitSlotRequest {
    #[serde(with = "date_format")]
    pub date: Date,
    pub start_time: String,
    pub capacity: i32,
    #[serde(default)]
    pub reason: Option<String>,
}

fn path_date(raw: &str) -> AppResult<Date> {
    parse_date(raw).map_err(AppError::from)
}

pub async fn day_schedule(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<DaySchedule>> {
    let date = path_date(&date)?;
    Ok(Json(state.scheduler.day_schedule(date).await?))
}

pub async fn slot_status(
    State(state): State<AppState>,
    Path((date, start)): Path<(String, String)>,
) -> AppResult<Json<SlotStatusResponse>> {
    let date = path_date(&date)?;
    let start = parse_clock(&start)?;
    let slot_state = state.scheduler.slot_state(date, start).await?;
    Ok(Json(SlotStatusResponse {
        date,
        start,
        available: slot_state.is_bookable(),
        state: slot_state,
    }))
}

pub async fn list_unavailability(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<Vec<UnavailabilityRecord>>> {
    let date = path_date(&date)?;
    Ok(Json(state.scheduler.list_unavailability(date).await?))
}

pub async fn mark_unavailable(
    State(state): State<AppState>,
    Json(request): Json<MarkUnavailableRequest>,
) -> AppResult<(StatusCode, Json<UnavailabilityRecord>)> {
    let starts = request
        .slots
        .iter()
        .map(|raw| parse_clock(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let record = state
        .scheduler
        .mark_unavailable(request.date, &starts, request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn limit_slot(
    State(state): State<AppState>,
    Json(request): Json<LimitSlotRequest>,
) -> AppResult<(StatusCode, Json<UnavailabilityRecord>)> {
    let start = parse_clock(&request.start_time)?;
    let record = state
        .scheduler
        .limit_slot(request.date, start, request.capacity, request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn adjust_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(adjustment): Json<SlotAdjustment>,
) -> AppResult<Json<UnavailabilityRecord>> {
    Ok(Json(state.scheduler.adjust_slot(id, adjustment).await?))
}

pub async fn delete_unavailability_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.scheduler.delete_unavailability_slot(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_unavailability(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<Value>> {
    let date = path_date(&date)?;
    let removed = state.scheduler.clear_unavailability(date).await?;
    Ok(Json(json!({ "date": date.to_string(), "removed": removed })))
}
