use time::{Date, Time};
use tracing::{info, warn};
use uuid::Uuid;

use super::clock::{format_clock, TimeRange};
use super::error::{BookingError, BookingResult};
use super::events::ScheduleEvent;
use super::service::SchedulingService;
use crate::db::{
    DatabaseError, NewUnavailability, SlotAdjustment, UnavailabilityKind, UnavailabilityRecord,
};

impl SchedulingService {
    pub async fn list_unavailability(&self, date: Date) -> BookingResult<Vec<UnavailabilityRecord>> {
        Ok(self.availability.list_for_date(date).await?)
    }

    /// Blocks a selection of slots with one hard-block record running from
    /// the earliest selected start to the end of the latest selected slot.
    pub async fn mark_unavailable(
        &self,
        date: Date,
        slot_starts: &[Time],
        reason: Option<String>,
    ) -> BookingResult<UnavailabilityRecord> {
        self.check_on_grid(slot_starts)?;
        let (Some(earliest), Some(latest)) =
            (slot_starts.iter().min().copied(), slot_starts.iter().max().copied())
        else {
            return Err(BookingError::Validation(
                "Select at least one slot to block".to_string(),
            ));
        };

        let range = TimeRange::new(earliest, self.grid.slot_end(latest))?;
        let record = self
            .availability
            .create(NewUnavailability::block(date, range, non_blank(reason)))
            .await?;

        info!(record_id = %record.id, %date, %range, "Slots marked unavailable");
        self.events.publish(ScheduleEvent::AvailabilityChanged {
            date,
            record_id: record.id,
        });
        Ok(record)
    }

    /// Opens a single slot for up to `capacity` bookings.
    pub async fn limit_slot(
        &self,
        date: Date,
        slot: Time,
        capacity: i32,
        reason: Option<String>,
    ) -> BookingResult<UnavailabilityRecord> {
        if capacity < 1 {
            return Err(BookingError::Validation(
                "Capacity must be at least 1".to_string(),
            ));
        }
        self.check_on_grid(&[slot])?;

        let range = self.grid.slot_range(slot)?;
        let record = match self
            .availability
            .create(NewUnavailability::limit(date, range, capacity, non_blank(reason)))
            .await
        {
            Ok(record) => record,
            Err(DatabaseError::Duplicate) => {
                return Err(BookingError::Validation(format!(
                    "{} on {date} already has a capacity record",
                    format_clock(slot)
                )))
            }
            Err(err) => return Err(err.into()),
        };

        info!(record_id = %record.id, %date, capacity, "Slot capacity limited");
        self.events.publish(ScheduleEvent::AvailabilityChanged {
            date,
            record_id: record.id,
        });
        Ok(record)
    }

    /// Explicit admin edit of capacity, booked count or reason.
    ///
    /// Only the fields the admin set are sent to the store, which checks
    /// `booked <= capacity` against the live row. Bookings landing during the
    /// edit are kept.
    pub async fn adjust_slot(
        &self,
        id: Uuid,
        adjustment: SlotAdjustment,
    ) -> BookingResult<UnavailabilityRecord> {
        let current = self
            .availability
            .get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Unavailability record {id}")))?;

        let counts_changed = adjustment.capacity.is_some() || adjustment.booked.is_some();
        if current.kind == UnavailabilityKind::Block && counts_changed {
            return Err(BookingError::Validation(
                "A blocked range has no capacity; remove it and limit the slot instead".to_string(),
            ));
        }
        if adjustment.capacity.is_some_and(|capacity| capacity < 1) {
            return Err(BookingError::Validation(
                "Capacity must be at least 1".to_string(),
            ));
        }
        if adjustment.booked.is_some_and(|booked| booked < 0) {
            return Err(BookingError::Validation(
                "Booked count cannot be negative".to_string(),
            ));
        }

        let adjustment = SlotAdjustment {
            reason: non_blank(adjustment.reason),
            ..adjustment
        };
        let record = self.availability.update(id, adjustment).await.map_err(|err| match err {
            DatabaseError::NotFound => BookingError::NotFound(format!("Unavailability record {id}")),
            DatabaseError::InvalidInput(_) => BookingError::Validation(
                "Booked count cannot exceed capacity".to_string(),
            ),
            other => other.into(),
        })?;

        info!(
            record_id = %id,
            capacity = ?record.capacity,
            booked = ?record.booked,
            "Slot adjusted by admin"
        );
        self.events.publish(ScheduleEvent::AvailabilityChanged {
            date: record.date,
            record_id: id,
        });
        Ok(record)
    }

    /// Removes every record for `date`, returning how many were deleted.
    pub async fn clear_unavailability(&self, date: Date) -> BookingResult<u64> {
        let removed = self.availability.delete_for_date(date).await?;
        info!(%date, removed, "Cleared unavailability for date");
        self.events.publish(ScheduleEvent::DayCleared { date, removed });
        Ok(removed)
    }

    pub async fn delete_unavailability_slot(&self, id: Uuid) -> BookingResult<()> {
        let record = self
            .availability
            .get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Unavailability record {id}")))?;

        if !self.availability.delete(id).await? {
            warn!(record_id = %id, "Record vanished before delete");
            return Err(BookingError::NotFound(format!("Unavailability record {id}")));
        }

        info!(record_id = %id, date = %record.date, "Unavailability record deleted");
        self.events.publish(ScheduleEvent::AvailabilityChanged {
            date: record.date,
            record_id: id,
        });
        Ok(())
    }

    fn check_on_grid(&self, slots: &[Time]) -> BookingResult<()> {
        match slots.iter().find(|slot| !self.grid.contains_start(**slot)) {
            Some(slot) => Err(BookingError::Validation(format!(
                "{} is not a slot start on the clinic grid",
                format_clock(*slot)
            ))),
            None => Ok(()),
        }
    }
}

fn non_blank(reason: Option<String>) -> Option<String> {
    reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty())
}
