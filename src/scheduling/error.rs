use thiserror::Error;
use time::{Date, Time};
use validator::ValidationErrors;

use super::clock::{format_clock, ClockError};
use crate::db::{AppointmentStatus, DatabaseError};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Slot {} on {date} is no longer available", format_clock(*.start))]
    SlotTaken { date: Date, start: Time },

    #[error("Slot {} on {date} is fully booked", format_clock(*.start))]
    CapacityExceeded { date: Date, start: Time },

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// `accounting` carries a second, independent failure from the
    /// availability store, when one happened while handling the first.
    #[error(
        "Store unavailable: {source}{}",
        .accounting.as_ref().map(|err| format!("; availability bookkeeping also failed: {err}")).unwrap_or_default()
    )]
    StoreUnavailable {
        #[source]
        source: DatabaseError,
        accounting: Option<DatabaseError>,
    },
}

impl BookingError {
    /// True when the caller should re-fetch the schedule and pick another slot.
    pub fn is_slot_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::SlotTaken { .. } | BookingError::CapacityExceeded { .. }
        )
    }
}

impl From<DatabaseError> for BookingError {
    fn from(source: DatabaseError) -> Self {
        BookingError::StoreUnavailable {
            source,
            accounting: None,
        }
    }
}

impl From<ClockError> for BookingError {
    fn from(err: ClockError) -> Self {
        BookingError::Validation(err.to_string())
    }
}

impl From<ValidationErrors> for BookingError {
    fn from(err: ValidationErrors) -> Self {
        BookingError::Validation(err.to_string())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
