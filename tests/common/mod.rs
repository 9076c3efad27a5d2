#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use time::{macros::date, Date};
use tokio::sync::Barrier;
use uuid::Uuid;

use clinic_scheduler::db::repositories::{
    MemoryAppointmentStore, MemoryAvailabilityStore, MemoryMedicineStore,
};
use clinic_scheduler::db::{
    Appointment, AppointmentDraft, AppointmentFilter, AppointmentPatch, Claim, DatabaseError,
    Diagnosis, NewAppointment, NewUnavailability, OccupationCategory, OccupationContext,
    Prescription, SlotAdjustment, StoreResult, UnavailabilityRecord,
};
use clinic_scheduler::scheduling::clock::TimeRange;
use clinic_scheduler::scheduling::{
    AppointmentStore, AvailabilityStore, SchedulingService, TimeGrid,
};

pub const DAY: Date = date!(2024 - 05 - 06);

pub struct Harness {
    pub service: Arc<SchedulingService>,
    pub availability: Arc<dyn AvailabilityStore>,
    pub medicines: Arc<MemoryMedicineStore>,
}

/// 08:00-17:00 in 30 minute slots on in-memory stores.
pub fn harness() -> Harness {
    harness_with(Arc::new(MemoryAppointmentStore::new()))
}

pub fn harness_with(appointments: Arc<dyn AppointmentStore>) -> Harness {
    harness_on(appointments, Arc::new(MemoryAvailabilityStore::new()))
}

pub fn harness_on(
    appointments: Arc<dyn AppointmentStore>,
    availability: Arc<dyn AvailabilityStore>,
) -> Harness {
    let medicines = Arc::new(MemoryMedicineStore::new());
    let service = SchedulingService::new(
        TimeGrid::default(),
        appointments,
        availability.clone(),
        medicines.clone(),
    );
    Harness {
        service: Arc::new(service),
        availability,
        medicines,
    }
}

pub fn draft(patient: &str) -> AppointmentDraft {
    AppointmentDraft {
        patient_name: patient.to_string(),
        reason: "Toothache".to_string(),
        owner_id: format!("owner-{patient}"),
        occupation: OccupationContext {
            category: OccupationCategory::Student,
            sub_category: "College".to_string(),
        },
    }
}

pub fn diagnosis(prescriptions: Vec<Prescription>) -> Diagnosis {
    Diagnosis {
        blood_pressure: "120/80".to_string(),
        chief_complaints: vec!["Headache".to_string()],
        notes: None,
        dental_types: Vec::new(),
        prescriptions,
    }
}

pub fn rx(medicine_id: Uuid, quantity: u32) -> Prescription {
    Prescription {
        medicine_id,
        quantity,
    }
}

/// Appointment store whose writes always fail; reads see nothing.
pub struct UnreachableAppointmentStore;

fn offline() -> DatabaseError {
    DatabaseError::ConnectionError("connection refused".to_string())
}

#[async_trait]
impl AppointmentStore for UnreachableAppointmentStore {
    async fn create(&self, _appointment: NewAppointment) -> StoreResult<Appointment> {
        Err(offline())
    }

    async fn get(&self, _id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(None)
    }

    async fn list(&self, _filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        Ok(Vec::new())
    }

    async fn update(&self, _id: Uuid, _patch: AppointmentPatch) -> StoreResult<Appointment> {
        Err(offline())
    }

    async fn delete(&self, _id: Uuid) -> StoreResult<bool> {
        Err(offline())
    }
}

/// Forwards to a memory store, but every `update` first lets a booking take
/// a seat on the record, as if it landed while an admin edit was in flight.
#[derive(Default)]
pub struct BookingDuringEdit {
    inner: MemoryAvailabilityStore,
}

#[async_trait]
impl AvailabilityStore for BookingDuringEdit {
    async fn create(&self, record: NewUnavailability) -> StoreResult<UnavailabilityRecord> {
        self.inner.create(record).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<UnavailabilityRecord>> {
        self.inner.get(id).await
    }

    async fn list_for_date(&self, date: Date) -> StoreResult<Vec<UnavailabilityRecord>> {
        self.inner.list_for_date(date).await
    }

    async fn update(
        &self,
        id: Uuid,
        adjustment: SlotAdjustment,
    ) -> StoreResult<UnavailabilityRecord> {
        self.inner.increment_booked(id).await?;
        self.inner.update(id, adjustment).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete(id).await
    }

    async fn delete_for_date(&self, date: Date) -> StoreResult<u64> {
        self.inner.delete_for_date(date).await
    }

    async fn increment_booked(&self, id: Uuid) -> StoreResult<Claim> {
        self.inner.increment_booked(id).await
    }

    async fn reserve(&self, date: Date, range: TimeRange, reason: &str) -> StoreResult<Claim> {
        self.inner.reserve(date, range, reason).await
    }

    async fn release(&self, id: Uuid) -> StoreResult<()> {
        self.inner.release(id).await
    }
}

/// Reads and admin writes work; seat claims fail with a connection error.
#[derive(Default)]
pub struct ClaimsOffline {
    inner: MemoryAvailabilityStore,
}

#[async_trait]
impl AvailabilityStore for ClaimsOffline {
    async fn create(&self, record: NewUnavailability) -> StoreResult<UnavailabilityRecord> {
        self.inner.create(record).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<UnavailabilityRecord>> {
        self.inner.get(id).await
    }

    async fn list_for_date(&self, date: Date) -> StoreResult<Vec<UnavailabilityRecord>> {
        self.inner.list_for_date(date).await
    }

    async fn update(
        &self,
        id: Uuid,
        adjustment: SlotAdjustment,
    ) -> StoreResult<UnavailabilityRecord> {
        self.inner.update(id, adjustment).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete(id).await
    }

    async fn delete_for_date(&self, date: Date) -> StoreResult<u64> {
        self.inner.delete_for_date(date).await
    }

    async fn increment_booked(&self, _id: Uuid) -> StoreResult<Claim> {
        Err(offline())
    }

    async fn reserve(&self, _date: Date, _range: TimeRange, _reason: &str) -> StoreResult<Claim> {
        Err(offline())
    }

    async fn release(&self, id: Uuid) -> StoreResult<()> {
        self.inner.release(id).await
    }
}

/// Memory appointment store whose first `readers` reads wait for each
/// other, so every session reads the same row before any of them writes.
pub struct LockstepReads {
    inner: MemoryAppointmentStore,
    gate: Barrier,
    readers: usize,
    arrived: AtomicUsize,
}

impl LockstepReads {
    pub fn new(readers: usize) -> Self {
        Self {
            inner: MemoryAppointmentStore::new(),
            gate: Barrier::new(readers),
            readers,
            arrived: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AppointmentStore for LockstepReads {
    async fn create(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        self.inner.create(appointment).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        let found = self.inner.get(id).await?;
        if self.arrived.fetch_add(1, Ordering::SeqCst) < self.readers {
            self.gate.wait().await;
        }
        Ok(found)
    }

    async fn list(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        self.inner.list(filter).await
    }

    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> StoreResult<Appointment> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete(id).await
    }
}
