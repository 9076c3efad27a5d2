use serde::Serialize;
use time::{macros::time, Date, Time};

use super::clock::{
    self, clock_format, date_format, format_clock, minutes_since_midnight, ClockError, TimeRange,
};

/// One bookable unit on a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    #[serde(with = "date_format")]
    pub date: Date,
    #[serde(with = "clock_format")]
    pub start: Time,
    #[serde(with = "clock_format")]
    pub end: Time,
}

/// The bookable grid of a clinic day: slot starts from `open` up to the last
/// start that does not exceed `close`, every `slot_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    open: u16,
    close: u16,
    slot_minutes: u16,
}

impl TimeGrid {
    pub const DEFAULT_SLOT_MINUTES: u16 = 30;
    pub const DEFAULT_OPEN: Time = time!(8:00);
    pub const DEFAULT_CLOSE: Time = time!(17:00);

    pub fn new(open: Time, close: Time, slot_minutes: u16) -> Result<Self, ClockError> {
        if slot_minutes == 0 {
            return Err(ClockError::InvalidGrid(
                "slot length must be at least one minute".to_string(),
            ));
        }
        let (open, close) = (minutes_since_midnight(open), minutes_since_midnight(close));
        if open > close {
            return Err(ClockError::InvalidGrid(format!(
                "opening time {} is after closing time {}",
                format_clock(clock::from_minutes(open).unwrap_or(Time::MIDNIGHT)),
                format_clock(clock::from_minutes(close).unwrap_or(Time::MIDNIGHT)),
            )));
        }
        Ok(Self {
            open,
            close,
            slot_minutes,
        })
    }

    pub fn slot_minutes(&self) -> u16 {
        self.slot_minutes
    }

    /// Slot start times in order. Each call starts a fresh pass.
    pub fn starts(&self) -> SlotStarts {
        SlotStarts {
            next: Some(self.open),
            close: self.close,
            step: self.slot_minutes,
        }
    }

    pub fn slots(&self, date: Date) -> impl Iterator<Item = TimeSlot> + '_ {
        self.starts().map(move |start| TimeSlot {
            date,
            start,
            end: self.slot_end(start),
        })
    }

    /// Whether `time` is exactly one of the grid's slot starts.
    pub fn contains_start(&self, time: Time) -> bool {
        let minute = minutes_since_midnight(time);
        time.second() == 0
            && (self.open..=self.close).contains(&minute)
            && (minute - self.open) % self.slot_minutes == 0
    }

    /// End of the slot starting at `start`, clamped to the last minute of the day.
    pub fn slot_end(&self, start: Time) -> Time {
        let end = (minutes_since_midnight(start) + self.slot_minutes).min(clock::MINUTES_PER_DAY - 1);
        clock::from_minutes(end).unwrap_or(Time::MIDNIGHT)
    }

    pub fn slot_range(&self, start: Time) -> Result<TimeRange, ClockError> {
        TimeRange::new(start, self.slot_end(start))
    }
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self {
            open: minutes_since_midnight(Self::DEFAULT_OPEN),
            close: minutes_since_midnight(Self::DEFAULT_CLOSE),
            slot_minutes: Self::DEFAULT_SLOT_MINUTES,
        }
    }
}

impl<'a> IntoIterator for &'a TimeGrid {
    type Item = Time;
    type IntoIter = SlotStarts;

    fn into_iter(self) -> Self::IntoIter {
        self.starts()
    }
}

#[derive(Debug, Clone)]
pub struct SlotStarts {
    next: Option<u16>,
    close: u16,
    step: u16,
}

impl Iterator for SlotStarts {
    type Item = Time;

    fn next(&mut self) -> Option<Time> {
        let current = self.next.filter(|minute| *minute <= self.close)?;
        self.next = current.checked_add(self.step);
        clock::from_minutes(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn clinic_day_has_nineteen_half_hour_slots() {
        let grid = TimeGrid::default();
        let starts: Vec<Time> = grid.starts().collect();
        assert_eq!(starts.len(), 19);
        assert_eq!(starts.first(), Some(&time!(8:00)));
        assert_eq!(starts.last(), Some(&time!(17:00)));
        assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn grid_is_restartable() {
        let grid = TimeGrid::default();
        let first: Vec<Time> = grid.into_iter().collect();
        let second: Vec<Time> = grid.into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn last_slot_never_exceeds_close() {
        let grid = TimeGrid::new(time!(8:00), time!(9:40), 30).unwrap();
        let starts: Vec<Time> = grid.starts().collect();
        assert_eq!(starts, vec![time!(8:00), time!(8:30), time!(9:00), time!(9:30)]);
    }

    #[test]
    fn slots_carry_their_end() {
        let grid = TimeGrid::default();
        let slot = grid.slots(date!(2024 - 05 - 01)).nth(2).unwrap();
        assert_eq!(slot.start, time!(9:00));
        assert_eq!(slot.end, time!(9:30));
    }

    #[test]
    fn only_aligned_starts_belong_to_the_grid() {
        let grid = TimeGrid::default();
        assert!(grid.contains_start(time!(8:00)));
        assert!(grid.contains_start(time!(16:30)));
        assert!(!grid.contains_start(time!(9:15)));
        assert!(!grid.contains_start(time!(7:30)));
        assert!(!grid.contains_start(time!(17:30)));
    }

    #[test]
    fn rejects_degenerate_grids() {
        assert!(TimeGrid::new(time!(8:00), time!(17:00), 0).is_err());
        assert!(TimeGrid::new(time!(17:00), time!(8:00), 30).is_err());
        assert_eq!(
            TimeGrid::new(time!(8:00), time!(8:00), 30)
                .unwrap()
                .starts()
                .count(),
            1
        );
    }
}
