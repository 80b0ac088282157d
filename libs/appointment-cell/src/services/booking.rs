// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::models::weekday_index;
use doctor_cell::services::{AvailabilityBlockService, WeeklyScheduleService};
use shared_models::interval::TimeRange;
use shared_utils::clock::Clock;

use crate::models::{
    Appointment, AppointmentError, AppointmentListQuery, AppointmentStatus, AppointmentType,
    BookAppointmentRequest, CancelAppointmentRequest, RescheduleAppointmentRequest,
    SchedulingConfig, StatusChange,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::directory::Directory;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::locks::SchedulingLocks;
use crate::services::slots::check_schedule;
use crate::services::store::AppointmentStore;

/// Owns every appointment write.
///
/// Each mutation re-reads the record and re-runs its checks inside the
/// scheduling lock of the appointment's doctor, then commits with a single
/// store call.
pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn Directory>,
    schedule: Arc<WeeklyScheduleService>,
    blocks: Arc<AvailabilityBlockService>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    locks: SchedulingLocks,
    clock: Arc<dyn Clock>,
    config: SchedulingConfig,
}

impl AppointmentBookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn Directory>,
        schedule: Arc<WeeklyScheduleService>,
        blocks: Arc<AvailabilityBlockService>,
        clock: Arc<dyn Clock>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(Arc::clone(&store)),
            lifecycle_service: AppointmentLifecycleService::new(),
            locks: SchedulingLocks::new(config.lock_timeout),
            store,
            directory,
            schedule,
            blocks,
            clock,
            config,
        }
    }

    /// Book a new appointment
    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id, patient_id = %request.patient_id))]
    pub async fn book_appointment(
        &self,
        organization_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for patient {} with doctor {} at {}",
              request.patient_id, request.doctor_id, request.start);

        self.directory.doctor(organization_id, request.doctor_id).await?;
        self.directory.patient(organization_id, request.patient_id).await?;
        let appointment_type = self.directory.appointment_type(request.type_id).await?;

        // A retry may arrive after the committed start has passed.
        if let Some(existing) = self.committed(organization_id, &request).await? {
            return self.replay(existing, &request);
        }
        let range = self.requested_range(&appointment_type, request.start)?;

        let _guard = self.locks.acquire(request.doctor_id, request.patient_id).await?;

        if let Some(existing) = self.committed(organization_id, &request).await? {
            return self.replay(existing, &request);
        }

        self.ensure_bookable(organization_id, request.doctor_id, request.patient_id, &range, None)
            .await?;

        let now = self.clock.now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            organization_id,
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            type_id: request.type_id,
            start: range.start,
            end: range.end,
            status: AppointmentStatus::Scheduled,
            notes: request.notes,
            cancellation_reason: None,
            request_id: request.request_id,
            history: vec![StatusChange {
                from: None,
                to: AppointmentStatus::Scheduled,
                at: now,
                note: None,
            }],
            created_at: now,
            updated_at: now,
        };

        let appointment = self.store.insert(appointment).await?;

        info!("Appointment {} booked successfully with doctor {}",
              appointment.id, appointment.doctor_id);
        Ok(appointment)
    }

    /// Move an appointment to a new start time, keeping its identity.
    #[instrument(skip(self, request))]
    pub async fn reschedule_appointment(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment: {}", appointment_id);

        let current = self.load(organization_id, appointment_id).await?;
        let appointment_type = self.directory.appointment_type(current.type_id).await?;
        let range = self.requested_range(&appointment_type, request.new_start)?;

        let _guard = self.locks.acquire(current.doctor_id, current.patient_id).await?;
        let mut appointment = self.load(organization_id, appointment_id).await?;

        self.lifecycle_service
            .validate_status_transition(appointment.status, AppointmentStatus::Rescheduled)?;
        self.ensure_bookable(
            organization_id,
            appointment.doctor_id,
            appointment.patient_id,
            &range,
            Some(appointment.id),
        )
        .await?;

        let mut note = format!("Moved from {} - {} to {} - {}",
                               appointment.start, appointment.end, range.start, range.end);
        if let Some(reason) = request.reason.as_deref().filter(|reason| !reason.trim().is_empty()) {
            note.push_str(": ");
            note.push_str(reason);
        }

        let now = self.clock.now();
        appointment.start = range.start;
        appointment.end = range.end;
        self.lifecycle_service
            .transition(&mut appointment, AppointmentStatus::Rescheduled, now, Some(note))?;

        let appointment = self.store.update(appointment).await?;

        info!("Appointment {} rescheduled to {}", appointment.id, appointment.start);
        Ok(appointment)
    }

    /// Cancel an appointment
    #[instrument(skip(self, request))]
    pub async fn cancel_appointment(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.load(organization_id, appointment_id).await?;
        let _guard = self.locks.acquire_doctor(current.doctor_id).await?;
        let mut appointment = self.load(organization_id, appointment_id).await?;

        let now = self.clock.now();
        if !self.lifecycle_service.can_be_cancelled(&appointment, now) {
            warn!("Appointment {} with status {} starting at {} cannot be cancelled",
                  appointment.id, appointment.status, appointment.start);
            let reason = if appointment.status.is_terminal() {
                format!("appointment is already {}", appointment.status)
            } else if appointment.start <= now {
                "appointment has already started".to_string()
            } else {
                format!("appointment is {}", appointment.status)
            };
            return Err(AppointmentError::NotCancellable(reason));
        }

        appointment.cancellation_reason = Some(request.reason.clone());
        self.lifecycle_service
            .transition(&mut appointment, AppointmentStatus::Cancelled, now, Some(request.reason))?;

        let appointment = self.store.update(appointment).await?;

        info!("Appointment {} cancelled successfully", appointment.id);
        Ok(appointment)
    }

    pub async fn confirm_appointment(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        self.change_status(organization_id, appointment_id, AppointmentStatus::Confirmed).await
    }

    pub async fn check_in(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        self.change_status(organization_id, appointment_id, AppointmentStatus::InProgress).await
    }

    pub async fn complete_appointment(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        self.change_status(organization_id, appointment_id, AppointmentStatus::Completed).await
    }

    pub async fn mark_no_show(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        self.change_status(organization_id, appointment_id, AppointmentStatus::NoShow).await
    }

    /// Get appointment by ID
    pub async fn get_appointment(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);
        self.load(organization_id, appointment_id).await
    }

    pub async fn doctor_appointments(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
        query: &AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments for doctor {}", doctor_id);

        self.directory.doctor(organization_id, doctor_id).await?;
        let (from, to) = Self::list_window(query)?;
        let appointments = self.store.doctor_appointments_between(doctor_id, from, to).await?;

        Ok(appointments
            .into_iter()
            .filter(|apt| apt.organization_id == organization_id)
            .collect())
    }

    pub async fn patient_appointments(
        &self,
        organization_id: Uuid,
        patient_id: Uuid,
        query: &AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments for patient {}", patient_id);

        self.directory.patient(organization_id, patient_id).await?;
        let (from, to) = Self::list_window(query)?;
        let appointments = self.store.patient_appointments_between(patient_id, from, to).await?;

        Ok(appointments
            .into_iter()
            .filter(|apt| apt.organization_id == organization_id)
            .collect())
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn change_status(
        &self,
        organization_id: Uuid,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Moving appointment {} to {}", appointment_id, new_status);

        let current = self.load(organization_id, appointment_id).await?;
        let _guard = self.locks.acquire_doctor(current.doctor_id).await?;
        let mut appointment = self.load(organization_id, appointment_id).await?;

        let now = self.clock.now();
        self.lifecycle_service
            .validate_status_transition(appointment.status, new_status)?;
        match new_status {
            AppointmentStatus::InProgress => self.lifecycle_service.check_in_allowed(
                &appointment,
                now,
                self.config.enforce_check_in_window,
            )?,
            AppointmentStatus::NoShow => self.lifecycle_service.no_show_allowed(&appointment, now)?,
            _ => {}
        }

        self.lifecycle_service
            .transition(&mut appointment, new_status, now, None)?;
        let appointment = self.store.update(appointment).await?;

        info!("Appointment {} is now {}", appointment.id, appointment.status);
        Ok(appointment)
    }

    /// Records of another organisation are reported as missing.
    async fn load(&self, organization_id: Uuid, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get(appointment_id)
            .await?
            .filter(|apt| apt.organization_id == organization_id)
            .ok_or_else(|| AppointmentError::NotFound("Appointment".to_string()))
    }

    fn requested_range(
        &self,
        appointment_type: &AppointmentType,
        start: DateTime<Utc>,
    ) -> Result<TimeRange, AppointmentError> {
        if start <= self.clock.now() {
            return Err(AppointmentError::Validation(
                "Appointment must be scheduled for a future time".to_string(),
            ));
        }

        if appointment_type.duration_minutes == 0 {
            return Err(AppointmentError::Validation(format!(
                "Appointment type {} has no duration",
                appointment_type.id
            )));
        }

        TimeRange::starting_at(start, appointment_type.duration()).ok_or_else(|| {
            AppointmentError::Validation("Appointment end is out of range".to_string())
        })
    }

    async fn committed(
        &self,
        organization_id: Uuid,
        request: &BookAppointmentRequest,
    ) -> Result<Option<Appointment>, AppointmentError> {
        match request.request_id {
            Some(request_id) => self.store.find_by_request_id(organization_id, request_id).await,
            None => Ok(None),
        }
    }

    /// Conflicts first, then the doctor's schedule and blocks.
    async fn ensure_bookable(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
        range: &TimeRange,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        if let Some(kind) = self
            .conflict_service
            .check_conflicts(doctor_id, patient_id, range, exclude_appointment_id)
            .await?
        {
            return Err(AppointmentError::Conflict(kind));
        }

        let entries = self
            .schedule
            .entries_for(organization_id, doctor_id, weekday_index(range.start.date_naive()))
            .await?;
        let blocks = self
            .blocks
            .blocks_overlapping(organization_id, doctor_id, range.start, range.end)
            .await?;

        check_schedule(&entries, &blocks, range).inspect_err(|e| {
            warn!("Doctor {} cannot take {} - {}: {}", doctor_id, range.start, range.end, e);
        })
    }

    /// A retried booking returns what the first attempt committed.
    fn replay(
        &self,
        existing: Appointment,
        request: &BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let same_booking = existing.doctor_id == request.doctor_id
            && existing.patient_id == request.patient_id
            && existing.type_id == request.type_id
            && existing.start == request.start;

        if !same_booking {
            warn!("Request id reused for a different booking (existing appointment {})", existing.id);
            return Err(AppointmentError::Validation(
                "Request id was already used for a different booking".to_string(),
            ));
        }

        info!("Returning appointment {} for repeated booking request", existing.id);
        Ok(existing)
    }

    fn list_window(query: &AppointmentListQuery) -> Result<(DateTime<Utc>, DateTime<Utc>), AppointmentError> {
        let from = query.from.unwrap_or(DateTime::<Utc>::MIN_UTC);
        let to = query.to.unwrap_or(DateTime::<Utc>::MAX_UTC);
        if from >= to {
            return Err(AppointmentError::Validation(
                "`from` must be before `to`".to_string(),
            ));
        }
        Ok((from, to))
    }
}
