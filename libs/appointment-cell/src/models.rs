// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, Duration};
use std::fmt;

use doctor_cell::models::DoctorError;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::interval::TimeRange;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub type_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub request_id: Option<Uuid>,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Audit record of one lifecycle move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: Option<AppointmentStatus>,
    pub to: AppointmentStatus,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
}

impl AppointmentStatus {
    /// Statuses that hold their time range against other bookings.
    pub fn is_active(&self) -> bool {
        matches!(self,
            AppointmentStatus::Scheduled |
            AppointmentStatus::Confirmed |
            AppointmentStatus::InProgress |
            AppointmentStatus::Rescheduled
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self,
            AppointmentStatus::Completed |
            AppointmentStatus::Cancelled |
            AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

/// Catalog entry consumed read-only by slot generation and booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentType {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: u32,
    pub price: f64,
}

impl AppointmentType {
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Bookable candidate interval. Carries no identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }
}

impl From<TimeRange> for Slot {
    fn from(range: TimeRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

// ==============================================================================
// DIRECTORY RECORDS (owned by external collaborators)
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PractitionerRole {
    Doctor,
    Nurse,
    Receptionist,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub full_name: String,
    pub role: PractitionerRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub full_name: String,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub type_id: Uuid,
    pub start: DateTime<Utc>,
    pub notes: Option<String>,
    /// Client-chosen key making retries of the same booking return the
    /// already committed appointment.
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_start: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub type_id: Uuid,
    pub granularity_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentListQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// ==============================================================================
// CONFIGURATION
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub slot_granularity_minutes: u32,
    pub lock_timeout: std::time::Duration,
    pub enforce_check_in_window: bool,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: 30,
            lock_timeout: std::time::Duration::from_secs(5),
            enforce_check_in_window: false,
        }
    }
}

impl From<&AppConfig> for SchedulingConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            slot_granularity_minutes: config.slot_granularity_minutes,
            lock_timeout: std::time::Duration::from_millis(config.booking_lock_timeout_ms),
            enforce_check_in_window: config.enforce_check_in_window,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    DoctorConflict,
    PatientConflict,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::DoctorConflict => write!(f, "doctor already has an appointment in this time range"),
            ConflictKind::PatientConflict => write!(f, "patient already has an appointment in this time range"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Booking conflict: {0}")]
    Conflict(ConflictKind),

    #[error("Doctor not available: {0}")]
    DoctorUnavailable(String),

    #[error("Appointment cannot be cancelled: {0}")]
    NotCancellable(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Timed out after {timeout_ms} ms waiting for the doctor's booking lock")]
    Timeout { timeout_ms: u64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppointmentError {
    /// Conflicts, unavailability and lock timeouts may succeed when retried
    /// after fetching fresh slots.
    pub fn is_retryable(&self) -> bool {
        matches!(self,
            AppointmentError::Conflict(_) |
            AppointmentError::DoctorUnavailable(_) |
            AppointmentError::Timeout { .. }
        )
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(error: DoctorError) -> Self {
        match error {
            DoctorError::Validation(msg) => AppointmentError::Validation(msg),
            DoctorError::NotFound(what) => AppointmentError::NotFound(what),
            other => AppointmentError::Storage(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        let message = error.to_string();
        match error {
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::NotFound(_) => AppError::NotFound(message),
            AppointmentError::Conflict(_)
            | AppointmentError::DoctorUnavailable(_)
            | AppointmentError::NotCancellable(_)
            | AppointmentError::InvalidTransition { .. } => AppError::Conflict(message),
            AppointmentError::Timeout { .. } => AppError::ServiceUnavailable(message),
            AppointmentError::Storage(msg) => AppError::Storage(msg),
        }
    }
}
