use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::{BookingError, BookingResult};
use super::events::ScheduleEvent;
use super::inventory::stock_deltas;
use super::lifecycle;
use super::service::SchedulingService;
use crate::db::{
    Appointment, AppointmentFilter, AppointmentPatch, AppointmentStatus, DatabaseError, Diagnosis,
};

impl SchedulingService {
    pub async fn get_appointment(&self, id: Uuid) -> BookingResult<Appointment> {
        self.appointments
            .get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Appointment {id}")))
    }

    pub async fn list_appointments(&self, filter: &AppointmentFilter) -> BookingResult<Vec<Appointment>> {
        Ok(self.appointments.list(filter).await?)
    }

    /// Cancels a scheduled appointment. The slot's booked counter is left
    /// alone; only an admin adjustment lowers it.
    pub async fn cancel_appointment(&self, id: Uuid, reason: &str) -> BookingResult<Appointment> {
        lifecycle::check_cancellation_reason(reason)?;
        let current = self.get_appointment(id).await?;
        lifecycle::check_transition(current.status, AppointmentStatus::Cancelled)?;

        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            cancellation_reason: Some(reason.trim().to_string()),
            diagnosis: None,
            expected: Some(current.version()),
        };
        let updated = self.write_patch(id, patch).await?;

        info!(appointment_id = %id, "Appointment cancelled");
        self.publish_status(&updated);
        Ok(updated)
    }

    /// Completes a scheduled appointment with its diagnosis, taking any
    /// prescribed medicine out of stock.
    pub async fn complete_appointment(
        &self,
        id: Uuid,
        diagnosis: Diagnosis,
    ) -> BookingResult<Appointment> {
        lifecycle::check_diagnosis(&diagnosis)?;
        let current = self.get_appointment(id).await?;
        lifecycle::check_transition(current.status, AppointmentStatus::Completed)?;

        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Completed),
            cancellation_reason: None,
            diagnosis: Some(diagnosis),
            expected: Some(current.version()),
        };
        let updated = self.write_diagnosis(&current, patch).await?;

        info!(appointment_id = %id, "Appointment completed");
        self.publish_status(&updated);
        Ok(updated)
    }

    /// Replaces the diagnosis of a completed appointment. Status is untouched.
    pub async fn update_diagnosis(&self, id: Uuid, diagnosis: Diagnosis) -> BookingResult<Appointment> {
        lifecycle::check_diagnosis(&diagnosis)?;
        let current = self.get_appointment(id).await?;
        if current.status != AppointmentStatus::Completed {
            return Err(BookingError::Validation(format!(
                "Diagnosis can only be edited on a completed appointment, this one is {}",
                current.status
            )));
        }

        let patch = AppointmentPatch {
            diagnosis: Some(diagnosis),
            expected: Some(current.version()),
            ..AppointmentPatch::default()
        };
        let updated = self.write_diagnosis(&current, patch).await?;

        info!(appointment_id = %id, "Diagnosis updated");
        Ok(updated)
    }

    pub async fn delete_appointment(&self, id: Uuid) -> BookingResult<()> {
        if !self.appointments.delete(id).await? {
            return Err(BookingError::NotFound(format!("Appointment {id}")));
        }
        info!(appointment_id = %id, "Appointment deleted");
        Ok(())
    }

    /// Moves stock by the prescription difference, then writes the patch;
    /// a failed write puts the stock back.
    async fn write_diagnosis(
        &self,
        current: &Appointment,
        patch: AppointmentPatch,
    ) -> BookingResult<Appointment> {
        let previous = current
            .diagnosis
            .as_ref()
            .map(|d| d.prescriptions.as_slice())
            .unwrap_or_default();
        let next = patch
            .diagnosis
            .as_ref()
            .map(|d| d.prescriptions.as_slice())
            .unwrap_or_default();
        let deltas = stock_deltas(previous, next);

        self.apply_stock_deltas(&deltas).await?;

        match self.write_patch(current.id, patch).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                error!(appointment_id = %current.id, error = %err, "Diagnosis write failed, restoring stock");
                let applied: Vec<(Uuid, i32)> = deltas
                    .iter()
                    .filter_map(|&(id, taken)| i32::try_from(-taken).ok().map(|change| (id, change)))
                    .collect();
                self.revert_stock(&applied).await;
                Err(err)
            }
        }
    }

    /// Writes `patch`. If the row moved on since it was read, the caller
    /// lost a race and gets the status it lost to.
    async fn write_patch(&self, id: Uuid, patch: AppointmentPatch) -> BookingResult<Appointment> {
        let target = patch.status;
        match self.appointments.update(id, patch).await {
            Ok(updated) => Ok(updated),
            Err(DatabaseError::NotFound) => Err(BookingError::NotFound(format!("Appointment {id}"))),
            Err(DatabaseError::Conflict) => {
                let current = self.get_appointment(id).await?;
                warn!(appointment_id = %id, status = %current.status, "Appointment changed by another session");
                Err(match target {
                    Some(to) => BookingError::InvalidTransition {
                        from: current.status,
                        to,
                    },
                    None => BookingError::Validation(format!(
                        "Appointment {id} was changed by someone else, reload it and retry"
                    )),
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    fn publish_status(&self, appointment: &Appointment) {
        self.events.publish(ScheduleEvent::AppointmentUpdated {
            date: appointment.date,
            appointment_id: appointment.id,
            status: appointment.status,
        });
    }
}
