//! Medicine stock bookkeeping driven by diagnosis prescriptions.

use std::collections::BTreeMap;

use tracing::{error, warn};
use uuid::Uuid;

use super::error::{BookingError, BookingResult};
use super::service::SchedulingService;
use crate::db::{DatabaseError, Prescription};

/// Units to take from stock per medicine when a prescription list changes
/// from `old` to `new`. Negative values are returned to stock.
pub fn stock_deltas(old: &[Prescription], new: &[Prescription]) -> Vec<(Uuid, i64)> {
    let mut deltas: BTreeMap<Uuid, i64> = BTreeMap::new();
    for p in new {
        *deltas.entry(p.medicine_id).or_default() += i64::from(p.quantity);
    }
    for p in old {
        *deltas.entry(p.medicine_id).or_default() -= i64::from(p.quantity);
    }
    deltas.into_iter().filter(|(_, delta)| *delta != 0).collect()
}

impl SchedulingService {
    /// Applies `deltas` one medicine at a time; if any step fails the ones
    /// already applied are reverted and nothing is left half-done.
    pub(super) async fn apply_stock_deltas(&self, deltas: &[(Uuid, i64)]) -> BookingResult<()> {
        let mut applied: Vec<(Uuid, i32)> = Vec::with_capacity(deltas.len());

        for &(medicine_id, taken) in deltas {
            let change = i32::try_from(-taken).map_err(|_| {
                BookingError::Validation(format!("Prescribed quantity for {medicine_id} is too large"))
            })?;

            let failure = match self.medicines.adjust_stock(medicine_id, change).await {
                Ok(Some(_)) => {
                    applied.push((medicine_id, change));
                    continue;
                }
                Ok(None) => {
                    let name = self.medicine_label(medicine_id).await;
                    warn!(%medicine_id, requested = taken, "Insufficient stock for prescription");
                    BookingError::Validation(format!("Insufficient stock for {name}"))
                }
                Err(DatabaseError::NotFound) => {
                    BookingError::Validation(format!("Unknown medicine {medicine_id}"))
                }
                Err(err) => err.into(),
            };

            self.revert_stock(&applied).await;
            return Err(failure);
        }

        Ok(())
    }

    /// Best-effort undo of changes made by `apply_stock_deltas`.
    pub(super) async fn revert_stock(&self, applied: &[(Uuid, i32)]) {
        for &(medicine_id, change) in applied.iter().rev() {
            if let Err(err) = self.medicines.adjust_stock(medicine_id, -change).await {
                error!(%medicine_id, change, error = %err, "Failed to revert stock change");
            }
        }
    }

    async fn medicine_label(&self, medicine_id: Uuid) -> String {
        match self.medicines.get(medicine_id).await {
            Ok(Some(medicine)) => medicine.name,
            _ => medicine_id.to_string(),
        }
    }
}
