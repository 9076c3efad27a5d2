use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::scheduling::clock::{clock_format, date_format, TimeRange};

/// How a record came to exist. Only `Reservation` records are ever removed
/// automatically, when a booking has to be compensated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "unavailability_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnavailabilityKind {
    Block,
    Limit,
    Reservation,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct UnavailabilityRecord {
    pub id: Uuid,
    #[serde(with = "date_format")]
    pub date: Date,
    #[serde(with = "clock_format")]
    pub range_start: Time,
    #[serde(with = "clock_format")]
    pub range_end: Time,
    pub reason: Option<String>,
    pub capacity: Option<i32>,
    pub booked: Option<i32>,
    pub kind: UnavailabilityKind,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UnavailabilityRecord {
    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            start: self.range_start,
            end: self.range_end,
        }
    }

    /// No capacity means nothing may be booked inside the range.
    pub fn is_hard_block(&self) -> bool {
        self.capacity.is_none()
    }

    pub fn booked_count(&self) -> i32 {
        self.booked.unwrap_or(0)
    }

    /// Seats left on a capacity-bearing record; `None` for hard blocks.
    pub fn remaining(&self) -> Option<i32> {
        self.capacity
            .map(|capacity| (capacity - self.booked_count()).max(0))
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct NewUnavailability {
    pub date: Date,
    pub range: TimeRange,
    pub reason: Option<String>,
    pub capacity: Option<i32>,
    pub booked: Option<i32>,
    pub kind: UnavailabilityKind,
}

impl NewUnavailability {
    pub fn block(date: Date, range: TimeRange, reason: Option<String>) -> Self {
        Self {
            date,
            range,
            reason,
            capacity: None,
            booked: None,
            kind: UnavailabilityKind::Block,
        }
    }

    pub fn limit(date: Date, range: TimeRange, capacity: i32, reason: Option<String>) -> Self {
        Self {
            date,
            range,
            reason,
            capacity: Some(capacity),
            booked: Some(0),
            kind: UnavailabilityKind::Limit,
        }
    }

    /// A one-seat record that marks a single slot as consumed by a booking.
    pub fn reservation(date: Date, range: TimeRange, reason: &str) -> Self {
        Self {
            date,
            range,
            reason: Some(reason.to_string()),
            capacity: Some(1),
            booked: Some(1),
            kind: UnavailabilityKind::Reservation,
        }
    }
}

/// Explicit admin edit of a record. The only path that may lower `booked`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotAdjustment {
    pub capacity: Option<i32>,
    pub booked: Option<i32>,
    pub reason: Option<String>,
}

/// Outcome of an atomic attempt to take one seat on a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    Granted(UnavailabilityRecord),
    Refused,
}
