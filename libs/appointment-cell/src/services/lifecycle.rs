// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, StatusChange};

pub struct AppointmentLifecycleService;

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Rescheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::InProgress => vec![AppointmentStatus::Completed],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => vec![],
        }
    }

    /// Cancellable status and a start still in the future.
    pub fn can_be_cancelled(&self, appointment: &Appointment, now: DateTime<Utc>) -> bool {
        matches!(
            appointment.status,
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed | AppointmentStatus::Rescheduled
        ) && appointment.start > now
    }

    /// Guard run before moving to `InProgress`.
    pub fn check_in_allowed(
        &self,
        appointment: &Appointment,
        now: DateTime<Utc>,
        enforce_window: bool,
    ) -> Result<(), AppointmentError> {
        if enforce_window && now < appointment.start {
            return Err(AppointmentError::Validation(format!(
                "Check-in opens at {}",
                appointment.start
            )));
        }
        Ok(())
    }

    /// A patient can only miss an appointment that has already started.
    pub fn no_show_allowed(&self, appointment: &Appointment, now: DateTime<Utc>) -> Result<(), AppointmentError> {
        if now < appointment.start {
            return Err(AppointmentError::Validation(
                "Cannot mark a future appointment as no-show".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and apply `new_status`, recording the move in the history.
    pub fn transition(
        &self,
        appointment: &mut Appointment,
        new_status: AppointmentStatus,
        now: DateTime<Utc>,
        note: Option<String>,
    ) -> Result<(), AppointmentError> {
        self.validate_status_transition(appointment.status, new_status)?;

        appointment.history.push(StatusChange {
            from: Some(appointment.status),
            to: new_status,
            at: now,
            note,
        });
        appointment.status = new_status;
        appointment.updated_at = now;
        Ok(())
    }
}
