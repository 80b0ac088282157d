use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::interval::TimeRange;

use crate::models::{Appointment, AppointmentError, ConflictKind};
use crate::services::store::AppointmentStore;

pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Check the doctor first, then the patient, against active appointments
    /// overlapping `range`. `exclude_appointment_id` skips the record being
    /// rescheduled.
    ///
    /// Callers that write afterwards must hold the booking locks of both
    /// parties so the answer stays valid until the write.
    pub async fn check_conflicts(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        range: &TimeRange,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Option<ConflictKind>, AppointmentError> {
        debug!("Checking conflicts for doctor {} and patient {} from {} to {}",
               doctor_id, patient_id, range.start, range.end);

        let doctor_conflicts = self
            .doctor_conflicts(doctor_id, range, exclude_appointment_id)
            .await?;
        if !doctor_conflicts.is_empty() {
            warn!("Conflict detected for doctor {} - {} conflicting appointments",
                  doctor_id, doctor_conflicts.len());
            return Ok(Some(ConflictKind::DoctorConflict));
        }

        let patient_conflicts = self
            .patient_conflicts(patient_id, range, exclude_appointment_id)
            .await?;
        if !patient_conflicts.is_empty() {
            warn!("Conflict detected for patient {} - {} conflicting appointments",
                  patient_id, patient_conflicts.len());
            return Ok(Some(ConflictKind::PatientConflict));
        }

        Ok(None)
    }

    pub async fn doctor_conflicts(
        &self,
        doctor_id: Uuid,
        range: &TimeRange,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self
            .store
            .doctor_appointments_between(doctor_id, range.start, range.end)
            .await?;
        Ok(Self::blocking(appointments, range, exclude_appointment_id))
    }

    pub async fn patient_conflicts(
        &self,
        patient_id: Uuid,
        range: &TimeRange,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self
            .store
            .patient_appointments_between(patient_id, range.start, range.end)
            .await?;
        Ok(Self::blocking(appointments, range, exclude_appointment_id))
    }

    fn blocking(
        appointments: Vec<Appointment>,
        range: &TimeRange,
        exclude_appointment_id: Option<Uuid>,
    ) -> Vec<Appointment> {
        appointments
            .into_iter()
            .filter(|apt| Some(apt.id) != exclude_appointment_id)
            .filter(|apt| apt.is_active())
            .filter(|apt| apt.range().overlaps(range))
            .collect()
    }
}
