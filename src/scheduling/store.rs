//! Store contracts the scheduling service is written against.
//!
//! Each store is its own failure domain; nothing here assumes a transaction
//! spanning two stores.

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use crate::db::{
    Appointment, AppointmentFilter, AppointmentPatch, Claim, MedicineStock, NewAppointment,
    NewMedicine, NewUnavailability, SlotAdjustment, StoreResult, UnavailabilityRecord,
};
use crate::scheduling::clock::TimeRange;

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create(&self, appointment: NewAppointment) -> StoreResult<Appointment>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Appointment>>;

    async fn list(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>>;

    /// Fails with `DatabaseError::NotFound` when `id` does not exist and with
    /// `DatabaseError::Conflict` when `patch.expected` no longer matches the
    /// stored row. The check and the write are one atomic step.
    async fn update(&self, id: Uuid, patch: AppointmentPatch) -> StoreResult<Appointment>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn create(&self, record: NewUnavailability) -> StoreResult<UnavailabilityRecord>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<UnavailabilityRecord>>;

    async fn list_for_date(&self, date: Date) -> StoreResult<Vec<UnavailabilityRecord>>;

    /// Applies only the fields set on `adjustment`, checking
    /// `booked <= capacity` against the stored row in the same step. A
    /// violation is `DatabaseError::InvalidInput`.
    async fn update(&self, id: Uuid, adjustment: SlotAdjustment) -> StoreResult<UnavailabilityRecord>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    async fn delete_for_date(&self, date: Date) -> StoreResult<u64>;

    /// Takes one seat on a capacity-bearing record iff `booked < capacity`,
    /// as a single atomic step.
    async fn increment_booked(&self, id: Uuid) -> StoreResult<Claim>;

    /// Inserts a one-seat reservation for the slot unless a capacity-bearing
    /// record already starts there.
    async fn reserve(&self, date: Date, range: TimeRange, reason: &str) -> StoreResult<Claim>;

    /// Gives back a seat taken by `increment_booked` or `reserve`.
    async fn release(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait MedicineStore: Send + Sync {
    async fn create(&self, medicine: NewMedicine) -> StoreResult<MedicineStock>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<MedicineStock>>;

    async fn list(&self) -> StoreResult<Vec<MedicineStock>>;

    /// Adds `delta` to the stock count. Returns `None` without changing
    /// anything when the result would be negative.
    async fn adjust_stock(&self, id: Uuid, delta: i32) -> StoreResult<Option<MedicineStock>>;
}
