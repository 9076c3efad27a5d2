use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::db::{
    Claim, DatabaseError, NewUnavailability, SlotAdjustment, StoreResult, UnavailabilityKind,
    UnavailabilityRecord,
};
use crate::scheduling::clock::TimeRange;
use crate::scheduling::store::AvailabilityStore;

const RECORD_COLUMNS: &str =
    "id, date, range_start, range_end, reason, capacity, booked, kind, created_at";

pub struct UnavailabilityRepository {
    pool: PgPool,
}

impl UnavailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityStore for UnavailabilityRepository {
    async fn create(&self, record: NewUnavailability) -> StoreResult<UnavailabilityRecord> {
        let sql = format!(
            r#"
            INSERT INTO unavailability (id, date, range_start, range_end, reason, capacity, booked, kind)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RECORD_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, UnavailabilityRecord>(&sql)
            .bind(Uuid::now_v7())
            .bind(record.date)
            .bind(record.range.start)
            .bind(record.range.end)
            .bind(record.reason)
            .bind(record.capacity)
            .bind(record.booked)
            .bind(record.kind)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<UnavailabilityRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM unavailability WHERE id = $1");
        Ok(sqlx::query_as::<_, UnavailabilityRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_for_date(&self, date: Date) -> StoreResult<Vec<UnavailabilityRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM unavailability WHERE date = $1 ORDER BY range_start, created_at"
        );
        Ok(sqlx::query_as::<_, UnavailabilityRecord>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, id: Uuid, adjustment: SlotAdjustment) -> StoreResult<UnavailabilityRecord> {
        let sql = format!(
            r#"
            UPDATE unavailability
            SET
                capacity = COALESCE($1, capacity),
                booked = COALESCE($2, booked),
                reason = COALESCE($3, reason)
            WHERE id = $4
              AND COALESCE($2, booked, 0) <= COALESCE($1, capacity, 0)
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, UnavailabilityRecord>(&sql)
            .bind(adjustment.capacity)
            .bind(adjustment.booked)
            .bind(adjustment.reason)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(record) => Ok(record),
            None if self.get(id).await?.is_some() => Err(DatabaseError::InvalidInput(
                "booked count exceeds capacity".to_string(),
            )),
            None => Err(DatabaseError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM unavailability WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_date(&self, date: Date) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM unavailability WHERE date = $1")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn increment_booked(&self, id: Uuid) -> StoreResult<Claim> {
        let sql = format!(
            r#"
            UPDATE unavailability
            SET booked = COALESCE(booked, 0) + 1
            WHERE id = $1
              AND capacity IS NOT NULL
              AND COALESCE(booked, 0) < capacity
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, UnavailabilityRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated.map_or(Claim::Refused, Claim::Granted))
    }

    async fn reserve(&self, date: Date, range: TimeRange, reason: &str) -> StoreResult<Claim> {
        let record = NewUnavailability::reservation(date, range, reason);
        let sql = format!(
            r#"
            INSERT INTO unavailability (id, date, range_start, range_end, reason, capacity, booked, kind)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (date, range_start) WHERE capacity IS NOT NULL DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, UnavailabilityRecord>(&sql)
            .bind(Uuid::now_v7())
            .bind(record.date)
            .bind(record.range.start)
            .bind(record.range.end)
            .bind(record.reason)
            .bind(record.capacity)
            .bind(record.booked)
            .bind(record.kind)
            .fetch_optional(&self.pool)
            .await?;
        Ok(inserted.map_or(Claim::Refused, Claim::Granted))
    }

    async fn release(&self, id: Uuid) -> StoreResult<()> {
        let removed = sqlx::query("DELETE FROM unavailability WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(UnavailabilityKind::Reservation)
            .execute(&self.pool)
            .await?;
        if removed.rows_affected() > 0 {
            return Ok(());
        }

        let decremented = sqlx::query(
            "UPDATE unavailability SET booked = GREATEST(COALESCE(booked, 0) - 1, 0) WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if decremented.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
