use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::scheduling::clock::{clock_format, date_format};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "occupation_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OccupationCategory {
    Student,
    Employee,
}

/// Who the appointment is for, kept for reporting (e.g. Student/College,
/// Employee/Office).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize, Validate)]
pub struct OccupationContext {
    pub category: OccupationCategory,
    #[validate(custom(function = "not_blank"))]
    pub sub_category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub medicine_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub blood_pressure: String,
    #[serde(default)]
    pub chief_complaints: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub dental_types: Vec<String>,
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_name: String,
    #[serde(with = "date_format")]
    pub date: Date,
    #[serde(with = "clock_format")]
    pub start_time: Time,
    pub reason: String,
    pub status: AppointmentStatus,
    pub owner_id: String,
    pub occupation: OccupationContext,
    pub cancellation_reason: Option<String>,
    pub diagnosis: Option<Diagnosis>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// What a scheduling UI submits alongside the chosen slot.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppointmentDraft {
    #[validate(custom(function = "not_blank", message = "Patient name is required"))]
    pub patient_name: String,
    #[validate(custom(function = "not_blank", message = "Reason for visit is required"))]
    pub reason: String,
    #[validate(custom(function = "not_blank", message = "Owner id is required"))]
    pub owner_id: String,
    #[validate(nested)]
    pub occupation: OccupationContext,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_name: String,
    pub date: Date,
    pub start_time: Time,
    pub reason: String,
    pub owner_id: String,
    pub occupation: OccupationContext,
}

impl NewAppointment {
    pub fn from_draft(draft: AppointmentDraft, date: Date, start_time: Time) -> Self {
        Self {
            patient_name: draft.patient_name.trim().to_string(),
            date,
            start_time,
            reason: draft.reason.trim().to_string(),
            owner_id: draft.owner_id,
            occupation: draft.occupation,
        }
    }
}

/// What a row looked like when it was read. A patch carrying one only
/// applies if the row is still in that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentVersion {
    pub status: AppointmentStatus,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub status: Option<AppointmentStatus>,
    pub cancellation_reason: Option<String>,
    pub diagnosis: Option<Diagnosis>,
    pub expected: Option<AppointmentVersion>,
}

impl Appointment {
    pub fn version(&self) -> AppointmentVersion {
        AppointmentVersion {
            status: self.status,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilter {
    #[serde(default, with = "date_format::option")]
    pub date: Option<Date>,
    pub owner_id: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentFilter {
    pub fn for_date(date: Date) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.date.map_or(true, |date| appointment.date == date)
            && self
                .owner_id
                .as_deref()
                .map_or(true, |owner| appointment.owner_id == owner)
            && self.status.map_or(true, |status| appointment.status == status)
    }
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
