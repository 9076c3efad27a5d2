//! The availability predicate. Pure functions over the records fetched for a
//! date; every scheduling surface goes through here.
//!
//! Hard blocks use interval containment with an exclusive end. Capacity
//! records only govern the slot their range starts at.

use serde::Serialize;
use time::{Date, Time};

use super::clock::{clock_format, date_format};
use super::grid::TimeGrid;
use crate::db::UnavailabilityRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotState {
    Open,
    Limited { remaining: i32 },
    Full,
    Blocked { reason: Option<String> },
}

impl SlotState {
    pub fn is_bookable(&self) -> bool {
        matches!(self, SlotState::Open | SlotState::Limited { .. })
    }
}

/// The capacity-bearing record governing `slot`, if any. When several
/// exist the fullest one wins.
pub fn capacity_record_at<'a>(
    records: &'a [UnavailabilityRecord],
    date: Date,
    slot: Time,
) -> Option<&'a UnavailabilityRecord> {
    records
        .iter()
        .filter(|record| record.date == date && !record.is_hard_block())
        .filter(|record| record.time_range().starts_at(slot))
        .min_by_key(|record| record.remaining())
}

pub fn slot_state(records: &[UnavailabilityRecord], date: Date, slot: Time) -> SlotState {
    if let Some(block) = records.iter().find(|record| {
        record.date == date && record.is_hard_block() && record.time_range().contains(slot)
    }) {
        return SlotState::Blocked {
            reason: block.reason.clone(),
        };
    }

    match capacity_record_at(records, date, slot).and_then(UnavailabilityRecord::remaining) {
        Some(0) => SlotState::Full,
        Some(remaining) => SlotState::Limited { remaining },
        None => SlotState::Open,
    }
}

pub fn is_available(records: &[UnavailabilityRecord], date: Date, slot: Time) -> bool {
    slot_state(records, date, slot).is_bookable()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    #[serde(with = "clock_format")]
    pub start: Time,
    #[serde(with = "clock_format")]
    pub end: Time,
    pub available: bool,
    #[serde(flatten)]
    pub state: SlotState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySchedule {
    #[serde(with = "date_format")]
    pub date: Date,
    pub slot_minutes: u16,
    pub slots: Vec<SlotAvailability>,
}

impl DaySchedule {
    pub fn build(grid: &TimeGrid, date: Date, records: &[UnavailabilityRecord]) -> Self {
        let slots = grid
            .slots(date)
            .map(|slot| {
                let state = slot_state(records, date, slot.start);
                SlotAvailability {
                    start: slot.start,
                    end: slot.end,
                    available: state.is_bookable(),
                    state,
                }
            })
            .collect();

        Self {
            date,
            slot_minutes: grid.slot_minutes(),
            slots,
        }
    }

    pub fn available_starts(&self) -> impl Iterator<Item = Time> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.available)
            .map(|slot| slot.start)
    }
}
