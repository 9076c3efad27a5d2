use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{DatabaseError, MedicineStock, NewMedicine, StoreResult};
use crate::scheduling::store::MedicineStore;

pub struct MedicineRepository {
    pool: PgPool,
}

impl MedicineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MedicineStore for MedicineRepository {
    async fn create(&self, medicine: NewMedicine) -> StoreResult<MedicineStock> {
        Ok(sqlx::query_as::<_, MedicineStock>(
            "INSERT INTO medicines (id, name, stock) VALUES ($1, $2, $3) RETURNING id, name, stock",
        )
        .bind(Uuid::now_v7())
        .bind(medicine.name.trim())
        .bind(medicine.stock)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<MedicineStock>> {
        Ok(
            sqlx::query_as::<_, MedicineStock>("SELECT id, name, stock FROM medicines WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list(&self) -> StoreResult<Vec<MedicineStock>> {
        Ok(
            sqlx::query_as::<_, MedicineStock>("SELECT id, name, stock FROM medicines ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn adjust_stock(&self, id: Uuid, delta: i32) -> StoreResult<Option<MedicineStock>> {
        let adjusted = sqlx::query_as::<_, MedicineStock>(
            r#"
            UPDATE medicines
            SET stock = stock + $1
            WHERE id = $2 AND stock + $1 >= 0
            RETURNING id, name, stock
            "#,
        )
        .bind(delta)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if adjusted.is_none() && self.get(id).await?.is_none() {
            return Err(DatabaseError::NotFound);
        }
        Ok(adjusted)
    }
}
