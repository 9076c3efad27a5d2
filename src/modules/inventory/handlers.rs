use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{MedicineStock, NewMedicine};
use crate::error::{AppError, AppResult};

pub async fn list_medicines(State(state): State<AppState>) -> AppResult<Json<Vec<MedicineStock>>> {
    Ok(Json(state.scheduler.medicines().list().await?))
}

pub async fn get_medicine(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MedicineStock>> {
    state
        .scheduler
        .medicines()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Medicine {id}")))
}

pub async fn create_medicine(
    State(state): State<AppState>,
    Json(medicine): Json<NewMedicine>,
) -> AppResult<(StatusCode, Json<MedicineStock>)> {
    medicine.validate()?;
    let created = state.scheduler.medicines().create(medicine).await?;
    info!(medicine_id = %created.id, stock = created.stock, "Medicine added to inventory");
    Ok((StatusCode::CREATED, Json(created)))
}
