use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::db::{
    Appointment, AppointmentFilter, AppointmentPatch, AppointmentStatus, DatabaseError, Diagnosis,
    NewAppointment, OccupationContext, StoreResult,
};
use crate::scheduling::store::AppointmentStore;

const APPOINTMENT_COLUMNS: &str = r#"
    id, patient_name, date, start_time, reason, status, owner_id,
    category, sub_category, cancellation_reason, diagnosis, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    patient_name: String,
    date: Date,
    start_time: Time,
    reason: String,
    status: AppointmentStatus,
    owner_id: String,
    #[sqlx(flatten)]
    occupation: OccupationContext,
    cancellation_reason: Option<String>,
    diagnosis: Option<Json<Diagnosis>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            patient_name: row.patient_name,
            date: row.date,
            start_time: row.start_time,
            reason: row.reason,
            status: row.status,
            owner_id: row.owner_id,
            occupation: row.occupation,
            cancellation_reason: row.cancellation_reason,
            diagnosis: row.diagnosis.map(|Json(diagnosis)| diagnosis),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentStore for AppointmentRepository {
    async fn create(&self, new: NewAppointment) -> StoreResult<Appointment> {
        let sql = format!(
            r#"
            INSERT INTO appointments
                (id, patient_name, date, start_time, reason, status, owner_id, category, sub_category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&new.patient_name)
            .bind(new.date)
            .bind(new.start_time)
            .bind(&new.reason)
            .bind(AppointmentStatus::Scheduled)
            .bind(&new.owner_id)
            .bind(new.occupation.category)
            .bind(&new.occupation.sub_category)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Appointment::from))
    }

    async fn list(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointments
            WHERE ($1::date IS NULL OR date = $1)
              AND ($2::text IS NULL OR owner_id = $2)
              AND ($3::appointment_status IS NULL OR status = $3)
            ORDER BY date, start_time, created_at
            "#
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(filter.date)
            .bind(filter.owner_id.as_deref())
            .bind(filter.status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> StoreResult<Appointment> {
        let sql = format!(
            r#"
            UPDATE appointments
            SET
                status = COALESCE($1, status),
                cancellation_reason = COALESCE($2, cancellation_reason),
                diagnosis = COALESCE($3, diagnosis),
                updated_at = NOW()
            WHERE id = $4
              AND ($5::appointment_status IS NULL OR status = $5)
              AND ($6::timestamptz IS NULL OR updated_at = $6)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(patch.status)
            .bind(patch.cancellation_reason)
            .bind(patch.diagnosis.map(Json))
            .bind(id)
            .bind(patch.expected.map(|expected| expected.status))
            .bind(patch.expected.map(|expected| expected.updated_at))
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(row) => Ok(row.into()),
            None if patch.expected.is_some() && self.get(id).await?.is_some() => {
                Err(DatabaseError::Conflict)
            }
            None => Err(DatabaseError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
