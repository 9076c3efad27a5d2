//! Process-local stores. Used when no database is configured and by tests.
//!
//! Each store keeps its rows behind one mutex, so the conditional operations
//! (`increment_booked`, `reserve`, `adjust_stock`) check and write in a
//! single critical section.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::db::{
    Appointment, AppointmentFilter, AppointmentPatch, AppointmentStatus, Claim, DatabaseError,
    MedicineStock, NewAppointment, NewMedicine, NewUnavailability, SlotAdjustment, StoreResult,
    UnavailabilityKind, UnavailabilityRecord,
};
use crate::scheduling::clock::TimeRange;
use crate::scheduling::store::{AppointmentStore, AvailabilityStore, MedicineStore};

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| DatabaseError::Unknown("in-memory store lock poisoned".to_string()))
}

#[derive(Debug, Default)]
pub struct MemoryAppointmentStore {
    rows: Mutex<HashMap<Uuid, Appointment>>,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn create(&self, new: NewAppointment) -> StoreResult<Appointment> {
        let now = OffsetDateTime::now_utc();
        let appointment = Appointment {
            id: Uuid::now_v7(),
            patient_name: new.patient_name,
            date: new.date,
            start_time: new.start_time,
            reason: new.reason,
            status: AppointmentStatus::Scheduled,
            owner_id: new.owner_id,
            occupation: new.occupation,
            cancellation_reason: None,
            diagnosis: None,
            created_at: now,
            updated_at: now,
        };
        lock(&self.rows)?.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(lock(&self.rows)?.get(&id).cloned())
    }

    async fn list(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let mut found: Vec<Appointment> = lock(&self.rows)?
            .values()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.date, a.start_time, a.created_at));
        Ok(found)
    }

    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> StoreResult<Appointment> {
        let mut rows = lock(&self.rows)?;
        let appointment = rows.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        if patch
            .expected
            .is_some_and(|expected| expected != appointment.version())
        {
            return Err(DatabaseError::Conflict);
        }
        if let Some(status) = patch.status {
            appointment.status = status;
        }
        if let Some(reason) = patch.cancellation_reason {
            appointment.cancellation_reason = Some(reason);
        }
        if let Some(diagnosis) = patch.diagnosis {
            appointment.diagnosis = Some(diagnosis);
        }
        appointment.updated_at = OffsetDateTime::now_utc();
        Ok(appointment.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(lock(&self.rows)?.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct MemoryAvailabilityStore {
    rows: Mutex<Vec<UnavailabilityRecord>>,
}

impl MemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn materialize(record: NewUnavailability) -> UnavailabilityRecord {
    UnavailabilityRecord {
        id: Uuid::now_v7(),
        date: record.date,
        range_start: record.range.start,
        range_end: record.range.end,
        reason: record.reason,
        capacity: record.capacity,
        booked: record.booked,
        kind: record.kind,
        created_at: OffsetDateTime::now_utc(),
    }
}

/// Mirrors the unique index on capacity-bearing records per slot start.
fn has_capacity_record(rows: &[UnavailabilityRecord], date: Date, range: &TimeRange) -> bool {
    rows.iter().any(|row| {
        row.date == date && row.capacity.is_some() && row.time_range().starts_at(range.start)
    })
}

#[async_trait]
impl AvailabilityStore for MemoryAvailabilityStore {
    async fn create(&self, record: NewUnavailability) -> StoreResult<UnavailabilityRecord> {
        let mut rows = lock(&self.rows)?;
        if record.capacity.is_some() && has_capacity_record(&rows, record.date, &record.range) {
            return Err(DatabaseError::Duplicate);
        }
        let record = materialize(record);
        rows.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<UnavailabilityRecord>> {
        Ok(lock(&self.rows)?.iter().find(|row| row.id == id).cloned())
    }

    async fn list_for_date(&self, date: Date) -> StoreResult<Vec<UnavailabilityRecord>> {
        let mut found: Vec<UnavailabilityRecord> = lock(&self.rows)?
            .iter()
            .filter(|row| row.date == date)
            .cloned()
            .collect();
        found.sort_by_key(|row| (row.range_start, row.created_at));
        Ok(found)
    }

    async fn update(&self, id: Uuid, adjustment: SlotAdjustment) -> StoreResult<UnavailabilityRecord> {
        let mut rows = lock(&self.rows)?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(DatabaseError::NotFound)?;
        let capacity = adjustment.capacity.or(row.capacity);
        let booked = adjustment.booked.or(row.booked);
        match (capacity, booked) {
            (Some(capacity), Some(booked)) if booked > capacity => {
                return Err(DatabaseError::InvalidInput(
                    "booked count exceeds capacity".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(DatabaseError::InvalidInput(
                    "booked count without capacity".to_string(),
                ))
            }
            _ => {}
        }
        row.capacity = capacity;
        row.booked = booked;
        if let Some(reason) = adjustment.reason {
            row.reason = Some(reason);
        }
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut rows = lock(&self.rows)?;
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() != before)
    }

    async fn delete_for_date(&self, date: Date) -> StoreResult<u64> {
        let mut rows = lock(&self.rows)?;
        let before = rows.len();
        rows.retain(|row| row.date != date);
        Ok((before - rows.len()) as u64)
    }

    async fn increment_booked(&self, id: Uuid) -> StoreResult<Claim> {
        let mut rows = lock(&self.rows)?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(DatabaseError::NotFound)?;
        match row.capacity {
            Some(capacity) if row.booked_count() < capacity => {
                row.booked = Some(row.booked_count() + 1);
                Ok(Claim::Granted(row.clone()))
            }
            _ => Ok(Claim::Refused),
        }
    }

    async fn reserve(&self, date: Date, range: TimeRange, reason: &str) -> StoreResult<Claim> {
        let mut rows = lock(&self.rows)?;
        if has_capacity_record(&rows, date, &range) {
            return Ok(Claim::Refused);
        }
        let record = materialize(NewUnavailability::reservation(date, range, reason));
        rows.push(record.clone());
        Ok(Claim::Granted(record))
    }

    async fn release(&self, id: Uuid) -> StoreResult<()> {
        let mut rows = lock(&self.rows)?;
        let index = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(DatabaseError::NotFound)?;
        if rows[index].kind == UnavailabilityKind::Reservation {
            rows.remove(index);
        } else {
            let row = &mut rows[index];
            row.booked = Some((row.booked_count() - 1).max(0));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryMedicineStore {
    rows: Mutex<HashMap<Uuid, MedicineStock>>,
}

impl MemoryMedicineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MedicineStore for MemoryMedicineStore {
    async fn create(&self, medicine: NewMedicine) -> StoreResult<MedicineStock> {
        let medicine = MedicineStock {
            id: Uuid::now_v7(),
            name: medicine.name.trim().to_string(),
            stock: medicine.stock,
        };
        lock(&self.rows)?.insert(medicine.id, medicine.clone());
        Ok(medicine)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<MedicineStock>> {
        Ok(lock(&self.rows)?.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<MedicineStock>> {
        let mut all: Vec<MedicineStock> = lock(&self.rows)?.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn adjust_stock(&self, id: Uuid, delta: i32) -> StoreResult<Option<MedicineStock>> {
        let mut rows = lock(&self.rows)?;
        let medicine = rows.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        match medicine.stock.checked_add(delta) {
            Some(stock) if stock >= 0 => {
                medicine.stock = stock;
                Ok(Some(medicine.clone()))
            }
            _ => Ok(None),
        }
    }
}
