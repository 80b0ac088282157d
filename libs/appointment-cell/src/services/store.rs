use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError};

/// Persistence for appointments, indexed by `(doctor_id, start)` and
/// `(patient_id, start)` for overlap queries.
///
/// Each write is all-or-nothing: a record is either fully stored or untouched.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    async fn find_by_request_id(
        &self,
        organization_id: Uuid,
        request_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentError>;

    /// Appointments of any status intersecting `[start, end)`, ordered by start.
    async fn doctor_appointments_between(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn patient_appointments_between(
        &self,
        patient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    /// Replaces the stored record with the same id.
    async fn update(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;
}

type TimeIndex = HashMap<Uuid, BTreeSet<(DateTime<Utc>, Uuid)>>;

#[derive(Default)]
struct Tables {
    appointments: HashMap<Uuid, Appointment>,
    by_doctor: TimeIndex,
    by_patient: TimeIndex,
    by_request: HashMap<(Uuid, Uuid), Uuid>,
}

impl Tables {
    fn index(&mut self, appointment: &Appointment) {
        let key = (appointment.start, appointment.id);
        self.by_doctor.entry(appointment.doctor_id).or_default().insert(key);
        self.by_patient.entry(appointment.patient_id).or_default().insert(key);
        if let Some(request_id) = appointment.request_id {
            self.by_request
                .insert((appointment.organization_id, request_id), appointment.id);
        }
    }

    fn unindex(&mut self, appointment: &Appointment) {
        let key = (appointment.start, appointment.id);
        if let Some(keys) = self.by_doctor.get_mut(&appointment.doctor_id) {
            keys.remove(&key);
        }
        if let Some(keys) = self.by_patient.get_mut(&appointment.patient_id) {
            keys.remove(&key);
        }
    }

    fn between(&self, index: &TimeIndex, owner: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Appointment> {
        let Some(keys) = index.get(&owner) else {
            return Vec::new();
        };

        keys.range(..(end, Uuid::nil()))
            .filter_map(|(_, id)| self.appointments.get(id))
            .filter(|appointment| appointment.end > start)
            .cloned()
            .collect()
    }
}

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    tables: RwLock<Tables>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.get(&appointment_id).cloned())
    }

    async fn find_by_request_id(
        &self,
        organization_id: Uuid,
        request_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_request
            .get(&(organization_id, request_id))
            .and_then(|id| tables.appointments.get(id))
            .cloned())
    }

    async fn doctor_appointments_between(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let tables = self.tables.read().await;
        Ok(tables.between(&tables.by_doctor, doctor_id, start, end))
    }

    async fn patient_appointments_between(
        &self,
        patient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let tables = self.tables.read().await;
        Ok(tables.between(&tables.by_patient, patient_id, start, end))
    }

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut tables = self.tables.write().await;
        if tables.appointments.contains_key(&appointment.id) {
            return Err(AppointmentError::Storage(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }
        if let Some(request_id) = appointment.request_id {
            if tables.by_request.contains_key(&(appointment.organization_id, request_id)) {
                return Err(AppointmentError::Validation(
                    "Request id was already used for a different booking".to_string(),
                ));
            }
        }

        tables.index(&appointment);
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut tables = self.tables.write().await;
        let previous = tables
            .appointments
            .get(&appointment.id)
            .cloned()
            .ok_or_else(|| AppointmentError::NotFound("Appointment".to_string()))?;

        tables.unindex(&previous);
        tables.index(&appointment);
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }
}
