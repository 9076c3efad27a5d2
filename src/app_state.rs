use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::db::{self, repositories};
use crate::scheduling::SchedulingService;

#[derive(Clone)]
pub struct AppState {
    pub db: Option<PgPool>,
    pub env: Config,
    pub scheduler: Arc<SchedulingService>,
}

impl AppState {
    pub fn new(db: Option<PgPool>, env: Config, scheduler: Arc<SchedulingService>) -> Self {
        Self { db, env, scheduler }
    }

    /// Wires the scheduling service to PostgreSQL when `DATABASE_URL` is
    /// set, otherwise to in-memory stores.
    pub async fn from_config(env: Config) -> Result<Self> {
        let grid = env.time_grid()?;

        let (db, scheduler) = match env.database.url.as_deref() {
            Some(url) => {
                let pool = db::init_pool(&env.database, url).await?;
                let scheduler = SchedulingService::new(
                    grid,
                    Arc::new(repositories::AppointmentRepository::new(pool.clone())),
                    Arc::new(repositories::UnavailabilityRepository::new(pool.clone())),
                    Arc::new(repositories::MedicineRepository::new(pool.clone())),
                );
                (Some(pool), scheduler)
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory stores; data is lost on restart");
                let scheduler = SchedulingService::new(
                    grid,
                    Arc::new(repositories::MemoryAppointmentStore::new()),
                    Arc::new(repositories::MemoryAvailabilityStore::new()),
                    Arc::new(repositories::MemoryMedicineStore::new()),
                );
                (None, scheduler)
            }
        };

        Ok(Self::new(db, env, Arc::new(scheduler)))
    }
}
