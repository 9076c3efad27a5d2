use serde::Serialize;
use time::{Date, Time};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use super::clock::{clock_format, date_format};
use crate::db::AppointmentStatus;

const CHANNEL_CAPACITY: usize = 128;

/// Change notifications pushed to open scheduling UIs so they re-fetch the
/// day instead of trusting a stale grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleEvent {
    SlotBooked {
        #[serde(with = "date_format")]
        date: Date,
        #[serde(with = "clock_format")]
        start: Time,
        appointment_id: Uuid,
    },
    AvailabilityChanged {
        #[serde(with = "date_format")]
        date: Date,
        record_id: Uuid,
    },
    DayCleared {
        #[serde(with = "date_format")]
        date: Date,
        removed: u64,
    },
    AppointmentUpdated {
        #[serde(with = "date_format")]
        date: Date,
        appointment_id: Uuid,
        status: AppointmentStatus,
    },
}

#[derive(Debug, Clone)]
pub struct ScheduleEvents {
    tx: broadcast::Sender<ScheduleEvent>,
}

impl ScheduleEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget; having no listeners is normal.
    pub fn publish(&self, event: ScheduleEvent) {
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            debug!(?event, "No schedule listeners connected");
        }
    }
}

impl Default for ScheduleEvents {
    fn default() -> Self {
        Self::new()
    }
}
