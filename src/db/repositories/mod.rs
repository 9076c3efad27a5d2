mod appointment_repository;
mod medicine_repository;
mod memory;
mod unavailability_repository;

pub use appointment_repository::AppointmentRepository;
pub use medicine_repository::MedicineRepository;
pub use memory::{MemoryAppointmentStore, MemoryAvailabilityStore, MemoryMedicineStore};
pub use unavailability_repository::UnavailabilityRepository;
