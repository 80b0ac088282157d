#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use doctor_cell::services::{
    AvailabilityBlockService, DoctorLookup, InMemoryScheduleStore, WeeklyScheduleService,
};
use doctor_cell::DoctorState;

/// Doctor ids mapped to the organisation that employs them.
#[derive(Default)]
pub struct TestRoster {
    doctors: Mutex<HashMap<Uuid, Uuid>>,
}

impl TestRoster {
    pub fn add_doctor(&self, organization_id: Uuid) -> Uuid {
        let doctor_id = Uuid::new_v4();
        self.doctors.lock().unwrap().insert(doctor_id, organization_id);
        doctor_id
    }
}

#[async_trait]
impl DoctorLookup for TestRoster {
    async fn ensure_doctor(&self, organization_id: Uuid, doctor_id: Uuid) -> Result<(), DoctorError> {
        match self.doctors.lock().unwrap().get(&doctor_id) {
            Some(owner) if *owner == organization_id => Ok(()),
            _ => Err(DoctorError::NotFound("Doctor".to_string())),
        }
    }
}

/// One organisation with an empty roster and fresh services.
pub struct TestPractice {
    pub organization_id: Uuid,
    pub roster: Arc<TestRoster>,
    pub schedule: Arc<WeeklyScheduleService>,
    pub blocks: Arc<AvailabilityBlockService>,
}

impl TestPractice {
    pub fn new() -> Self {
        let roster = Arc::new(TestRoster::default());
        let store = Arc::new(InMemoryScheduleStore::new());
        Self {
            organization_id: Uuid::new_v4(),
            schedule: Arc::new(WeeklyScheduleService::new(store.clone(), roster.clone())),
            blocks: Arc::new(AvailabilityBlockService::new(store, roster.clone())),
            roster,
        }
    }

    /// Registers a new doctor in this practice's organisation.
    pub fn doctor(&self) -> Uuid {
        self.roster.add_doctor(self.organization_id)
    }

    pub fn state(&self) -> DoctorState {
        DoctorState {
            schedule: self.schedule.clone(),
            blocks: self.blocks.clone(),
        }
    }
}
