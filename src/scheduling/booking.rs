use serde::Serialize;
use time::{Date, Time};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::availability::{self, DaySchedule, SlotState};
use super::clock::format_clock;
use super::error::{BookingError, BookingResult};
use super::events::ScheduleEvent;
use super::service::SchedulingService;
use crate::db::{
    Appointment, AppointmentDraft, Claim, DatabaseError, NewAppointment, UnavailabilityRecord,
};
use crate::telemetry::counters;

/// Reason stored on the one-seat record a booking creates for its slot.
pub const RESERVATION_REASON: &str = "Booked";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountingStatus {
    Recorded {
        record_id: Uuid,
        booked: i32,
        capacity: i32,
    },
    /// The appointment exists but the slot counter could not be updated.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingReceipt {
    pub appointment: Appointment,
    pub accounting: AccountingStatus,
}

impl SchedulingService {
    pub async fn day_schedule(&self, date: Date) -> BookingResult<DaySchedule> {
        let records = self.availability.list_for_date(date).await?;
        Ok(DaySchedule::build(&self.grid, date, &records))
    }

    pub async fn slot_state(&self, date: Date, slot: Time) -> BookingResult<SlotState> {
        let records = self.availability.list_for_date(date).await?;
        Ok(availability::slot_state(&records, date, slot))
    }

    pub async fn is_available(&self, date: Date, slot: Time) -> BookingResult<bool> {
        Ok(self.slot_state(date, slot).await?.is_bookable())
    }

    /// Books `slot` on `date`.
    ///
    /// The slot is re-checked against fresh records, then claimed with the
    /// availability store's atomic primitive before the appointment is
    /// written. A refused claim is authoritative and nothing is written. If
    /// the appointment write fails the claim is released again.
    #[instrument(skip(self, draft, slot), fields(slot = %format_clock(slot)))]
    pub async fn book_slot(
        &self,
        date: Date,
        slot: Time,
        draft: AppointmentDraft,
    ) -> BookingResult<BookingReceipt> {
        draft.validate()?;
        if !self.grid.contains_start(slot) {
            return Err(BookingError::Validation(format!(
                "{} is not a bookable slot start",
                format_clock(slot)
            )));
        }

        let records = self.availability.list_for_date(date).await?;
        let state = availability::slot_state(&records, date, slot);
        if !state.is_bookable() {
            warn!(?state, "Slot unavailable at submission time");
            counters::BOOKINGS_REJECTED.add(1);
            return Err(BookingError::SlotTaken { date, start: slot });
        }

        let claim = match availability::capacity_record_at(&records, date, slot) {
            Some(record) => self.claim_limited(record, date, slot).await?,
            None => self.claim_open(date, slot).await?,
        };

        let appointment = match self
            .appointments
            .create(NewAppointment::from_draft(draft, date, slot))
            .await
        {
            Ok(appointment) => appointment,
            Err(source) => {
                error!(error = %source, "Appointment write failed");
                let accounting = match claim {
                    Ok(record) => self.release_claim(&record).await.err(),
                    Err(claim_err) => Some(claim_err),
                };
                return Err(BookingError::StoreUnavailable { source, accounting });
            }
        };

        let accounting = match claim {
            Ok(record) => AccountingStatus::Recorded {
                record_id: record.id,
                booked: record.booked_count(),
                capacity: record.capacity.unwrap_or(1),
            },
            Err(err) => {
                error!(
                    appointment_id = %appointment.id,
                    error = %err,
                    "Appointment created but slot accounting failed"
                );
                counters::ACCOUNTING_FAILURES.add(1);
                AccountingStatus::Failed {
                    error: err.to_string(),
                }
            }
        };

        info!(appointment_id = %appointment.id, %date, "Slot booked");
        counters::BOOKINGS_CREATED.add(1);
        self.events.publish(ScheduleEvent::SlotBooked {
            date,
            start: slot,
            appointment_id: appointment.id,
        });

        Ok(BookingReceipt {
            appointment,
            accounting,
        })
    }

    /// Takes a seat on an admin-declared capacity record. The outer error is
    /// a rejection; the inner one a store failure reported with the receipt.
    async fn claim_limited(
        &self,
        record: &UnavailabilityRecord,
        date: Date,
        slot: Time,
    ) -> BookingResult<Result<UnavailabilityRecord, DatabaseError>> {
        match self.availability.increment_booked(record.id).await {
            Ok(Claim::Granted(updated)) => Ok(Ok(updated)),
            Ok(Claim::Refused) => {
                warn!(record_id = %record.id, "Capacity reached while booking");
                counters::BOOKINGS_REJECTED.add(1);
                Err(BookingError::CapacityExceeded { date, start: slot })
            }
            Err(err) => Ok(Err(err)),
        }
    }

    async fn claim_open(
        &self,
        date: Date,
        slot: Time,
    ) -> BookingResult<Result<UnavailabilityRecord, DatabaseError>> {
        let range = self.grid.slot_range(slot)?;
        match self.availability.reserve(date, range, RESERVATION_REASON).await {
            Ok(Claim::Granted(record)) => Ok(Ok(record)),
            Ok(Claim::Refused) => {
                warn!("Slot reserved by a concurrent booking");
                counters::BOOKINGS_REJECTED.add(1);
                Err(BookingError::SlotTaken { date, start: slot })
            }
            Err(err) => Ok(Err(err)),
        }
    }

    async fn release_claim(
        &self,
        record: &UnavailabilityRecord,
    ) -> Result<(), DatabaseError> {
        self.availability.release(record.id).await.inspect_err(|err| {
            error!(
                record_id = %record.id,
                error = %err,
                "Could not release slot claim after failed booking"
            );
            counters::ACCOUNTING_FAILURES.add(1);
        })
    }
}
