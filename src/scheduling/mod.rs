pub mod availability;
mod blocking;
mod booking;
pub mod clock;
pub mod error;
pub mod events;
pub mod grid;
mod inventory;
pub mod lifecycle;
mod records;
mod service;
pub mod store;

pub use availability::{DaySchedule, SlotAvailability, SlotState};
pub use booking::{AccountingStatus, BookingReceipt, RESERVATION_REASON};
pub use error::{BookingError, BookingResult};
pub use events::{ScheduleEvent, ScheduleEvents};
pub use grid::{TimeGrid, TimeSlot};
pub use inventory::stock_deltas;
pub use service::SchedulingService;
pub use store::{AppointmentStore, AvailabilityStore, MedicineStore};
