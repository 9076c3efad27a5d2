use std::sync::Arc;

use tokio::sync::broadcast;

use super::events::{ScheduleEvent, ScheduleEvents};
use super::grid::TimeGrid;
use super::store::{AppointmentStore, AvailabilityStore, MedicineStore};

/// The slot availability & booking service. One instance serves the
/// student, employee and admin scheduling surfaces alike.
///
/// Operations are split by concern: `booking` (grid, predicate, booking),
/// `blocking` (manual unavailability) and `records` (appointment lifecycle).
pub struct SchedulingService {
    pub(super) grid: TimeGrid,
    pub(super) appointments: Arc<dyn AppointmentStore>,
    pub(super) availability: Arc<dyn AvailabilityStore>,
    pub(super) medicines: Arc<dyn MedicineStore>,
    pub(super) events: ScheduleEvents,
}

impl SchedulingService {
    pub fn new(
        grid: TimeGrid,
        appointments: Arc<dyn AppointmentStore>,
        availability: Arc<dyn AvailabilityStore>,
        medicines: Arc<dyn MedicineStore>,
    ) -> Self {
        Self {
            grid,
            appointments,
            availability,
            medicines,
            events: ScheduleEvents::new(),
        }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.events.subscribe()
    }

    pub fn medicines(&self) -> &Arc<dyn MedicineStore> {
        &self.medicines
    }
}
