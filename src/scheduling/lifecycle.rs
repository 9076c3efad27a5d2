use tracing::warn;

use super::error::{BookingError, BookingResult};
use crate::db::{AppointmentStatus, Diagnosis};

/// Statuses reachable from `current`. Completed and Cancelled are terminal.
pub fn allowed_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Scheduled => &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
        AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
    }
}

pub fn check_transition(from: AppointmentStatus, to: AppointmentStatus) -> BookingResult<()> {
    if !allowed_transitions(from).contains(&to) {
        warn!(%from, %to, "Rejected appointment status transition");
        return Err(BookingError::InvalidTransition { from, to });
    }
    Ok(())
}

pub fn check_cancellation_reason(reason: &str) -> BookingResult<()> {
    if reason.trim().is_empty() {
        return Err(BookingError::Validation(
            "A cancellation reason is required".to_string(),
        ));
    }
    Ok(())
}

/// A diagnosis needs at least a blood pressure reading and one chief
/// complaint; every prescribed quantity must be positive.
pub fn check_diagnosis(diagnosis: &Diagnosis) -> BookingResult<()> {
    if diagnosis.blood_pressure.trim().is_empty() {
        return Err(BookingError::Validation(
            "Blood pressure is required to complete an appointment".to_string(),
        ));
    }
    if !diagnosis
        .chief_complaints
        .iter()
        .any(|complaint| !complaint.trim().is_empty())
    {
        return Err(BookingError::Validation(
            "At least one chief complaint is required to complete an appointment".to_string(),
        ));
    }
    if let Some(prescription) = diagnosis.prescriptions.iter().find(|p| p.quantity == 0) {
        return Err(BookingError::Validation(format!(
            "Prescribed quantity for medicine {} must be at least 1",
            prescription.medicine_id
        )));
    }
    Ok(())
}
