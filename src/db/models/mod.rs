mod appointment;
mod medicine;
mod unavailability;

pub use appointment::*;
pub use medicine::*;
pub use unavailability::*;
