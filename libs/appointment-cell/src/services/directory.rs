use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use doctor_cell::services::DoctorLookup;

use crate::models::{AppointmentError, AppointmentType, Patient, Practitioner, PractitionerRole};

/// Read-only lookups owned by the identity and catalog collaborators.
#[async_trait]
pub trait Directory: Send + Sync {
    /// A practitioner with the doctor role in `organization_id`.
    async fn doctor(&self, organization_id: Uuid, doctor_id: Uuid) -> Result<Practitioner, AppointmentError>;

    /// A patient registered in `organization_id`.
    async fn patient(&self, organization_id: Uuid, patient_id: Uuid) -> Result<Patient, AppointmentError>;

    async fn appointment_type(&self, type_id: Uuid) -> Result<AppointmentType, AppointmentError>;
}

/// Shape of the JSON seed file loaded by the API binary.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub practitioners: Vec<Practitioner>,
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub appointment_types: Vec<AppointmentType>,
}

#[derive(Default)]
pub struct InMemoryDirectory {
    practitioners: RwLock<HashMap<Uuid, Practitioner>>,
    patients: RwLock<HashMap<Uuid, Patient>>,
    appointment_types: RwLock<HashMap<Uuid, AppointmentType>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_seed(seed: DirectorySeed) -> Self {
        let directory = Self::new();
        for practitioner in seed.practitioners {
            directory.add_practitioner(practitioner).await;
        }
        for patient in seed.patients {
            directory.add_patient(patient).await;
        }
        for appointment_type in seed.appointment_types {
            directory.add_appointment_type(appointment_type).await;
        }
        directory
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AppointmentError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppointmentError::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        let seed: DirectorySeed = serde_json::from_str(&raw)
            .map_err(|e| AppointmentError::Storage(format!("Failed to parse {}: {}", path.display(), e)))?;

        info!("Loaded directory seed: {} practitioners, {} patients, {} appointment types",
              seed.practitioners.len(), seed.patients.len(), seed.appointment_types.len());

        Ok(Self::from_seed(seed).await)
    }

    pub async fn add_practitioner(&self, practitioner: Practitioner) {
        self.practitioners.write().await.insert(practitioner.id, practitioner);
    }

    pub async fn add_patient(&self, patient: Patient) {
        self.patients.write().await.insert(patient.id, patient);
    }

    pub async fn add_appointment_type(&self, appointment_type: AppointmentType) {
        self.appointment_types
            .write()
            .await
            .insert(appointment_type.id, appointment_type);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn doctor(&self, organization_id: Uuid, doctor_id: Uuid) -> Result<Practitioner, AppointmentError> {
        let practitioners = self.practitioners.read().await;
        match practitioners.get(&doctor_id) {
            Some(p) if p.organization_id == organization_id && p.role == PractitionerRole::Doctor => {
                Ok(p.clone())
            }
            Some(_) => {
                debug!("Practitioner {} is not a doctor of organization {}", doctor_id, organization_id);
                Err(AppointmentError::NotFound("Doctor".to_string()))
            }
            None => Err(AppointmentError::NotFound("Doctor".to_string())),
        }
    }

    async fn patient(&self, organization_id: Uuid, patient_id: Uuid) -> Result<Patient, AppointmentError> {
        let patients = self.patients.read().await;
        patients
            .get(&patient_id)
            .filter(|patient| patient.organization_id == organization_id)
            .cloned()
            .ok_or_else(|| AppointmentError::NotFound("Patient".to_string()))
    }

    async fn appointment_type(&self, type_id: Uuid) -> Result<AppointmentType, AppointmentError> {
        let types = self.appointment_types.read().await;
        types
            .get(&type_id)
            .cloned()
            .ok_or_else(|| AppointmentError::NotFound("Appointment type".to_string()))
    }
}

/// Lets the schedule and block services check doctors against this directory.
#[async_trait]
impl DoctorLookup for InMemoryDirectory {
    async fn ensure_doctor(&self, organization_id: Uuid, doctor_id: Uuid) -> Result<(), DoctorError> {
        match self.doctor(organization_id, doctor_id).await {
            Ok(_) => Ok(()),
            Err(AppointmentError::NotFound(what)) => Err(DoctorError::NotFound(what)),
            Err(other) => Err(DoctorError::Storage(other.to_string())),
        }
    }
}
