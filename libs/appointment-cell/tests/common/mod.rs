#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use appointment_cell::models::{
    AppointmentType, BookAppointmentRequest, Patient, Practitioner, PractitionerRole, SchedulingConfig,
};
use appointment_cell::services::{
    AppointmentBookingService, InMemoryAppointmentStore, InMemoryDirectory, SlotService,
};
use appointment_cell::AppointmentState;
use doctor_cell::models::SetScheduleEntryRequest;
use doctor_cell::services::{AvailabilityBlockService, InMemoryScheduleStore, WeeklyScheduleService};
use shared_utils::clock::MockClock;
use shared_utils::test_utils::{time, utc, TestConfig};

/// Monday used by every scenario.
pub const MONDAY: (i32, u32, u32) = (2030, 1, 7);

pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    utc(MONDAY.0, MONDAY.1, MONDAY.2, hour, minute)
}

pub struct TestClinic {
    pub organization_id: Uuid,
    pub doctor_id: Uuid,
    pub other_doctor_id: Uuid,
    pub receptionist_id: Uuid,
    pub patient_id: Uuid,
    pub other_patient_id: Uuid,
    pub consultation_type_id: Uuid,
    pub clock: Arc<MockClock>,
    pub directory: Arc<InMemoryDirectory>,
    pub store: Arc<InMemoryAppointmentStore>,
    pub schedule: Arc<WeeklyScheduleService>,
    pub blocks: Arc<AvailabilityBlockService>,
    pub booking: Arc<AppointmentBookingService>,
    pub slots: Arc<SlotService>,
}

impl TestClinic {
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Two doctors working Mondays 08:00-17:00 with a 12:00-13:00 break, two
    /// patients and a 30 minute consultation type. "Now" is a week earlier.
    pub async fn with_config(config: TestConfig) -> Self {
        let organization_id = Uuid::new_v4();
        let doctor_id = Uuid::new_v4();
        let other_doctor_id = Uuid::new_v4();
        let receptionist_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let other_patient_id = Uuid::new_v4();
        let consultation_type_id = Uuid::new_v4();

        let directory = Arc::new(InMemoryDirectory::new());
        for (id, name, role) in [
            (doctor_id, "Dr. Ada Lovelace", PractitionerRole::Doctor),
            (other_doctor_id, "Dr. Alan Turing", PractitionerRole::Doctor),
            (receptionist_id, "Grace Hopper", PractitionerRole::Receptionist),
        ] {
            directory
                .add_practitioner(Practitioner {
                    id,
                    organization_id,
                    full_name: name.to_string(),
                    role,
                })
                .await;
        }
        for (id, name) in [(patient_id, "John Doe"), (other_patient_id, "Jane Roe")] {
            directory
                .add_patient(Patient {
                    id,
                    organization_id,
                    full_name: name.to_string(),
                })
                .await;
        }
        directory
            .add_appointment_type(AppointmentType {
                id: consultation_type_id,
                name: "Consultation".to_string(),
                duration_minutes: 30,
                price: 50.0,
            })
            .await;

        let schedule_store = Arc::new(InMemoryScheduleStore::new());
        let schedule = Arc::new(WeeklyScheduleService::new(schedule_store.clone(), directory.clone()));
        let blocks = Arc::new(AvailabilityBlockService::new(schedule_store, directory.clone()));
        for doctor in [doctor_id, other_doctor_id] {
            schedule
                .set_entry(organization_id, doctor, monday_hours())
                .await
                .expect("seed schedule");
        }

        let clock = Arc::new(MockClock::new(utc(2030, 1, 1, 9, 0)));
        let store = Arc::new(InMemoryAppointmentStore::new());
        let scheduling = SchedulingConfig::from(&config.to_app_config());

        let booking = Arc::new(AppointmentBookingService::new(
            store.clone(),
            directory.clone(),
            schedule.clone(),
            blocks.clone(),
            clock.clone(),
            scheduling.clone(),
        ));
        let slots = Arc::new(SlotService::new(
            schedule.clone(),
            blocks.clone(),
            store.clone(),
            directory.clone(),
            clock.clone(),
            scheduling.slot_granularity_minutes,
        ));

        Self {
            organization_id,
            doctor_id,
            other_doctor_id,
            receptionist_id,
            patient_id,
            other_patient_id,
            consultation_type_id,
            clock,
            directory,
            store,
            schedule,
            blocks,
            booking,
            slots,
        }
    }

    pub fn state(&self) -> AppointmentState {
        AppointmentState {
            booking: self.booking.clone(),
            slots: self.slots.clone(),
        }
    }

    pub fn request(&self, doctor_id: Uuid, patient_id: Uuid, start: DateTime<Utc>) -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id,
            patient_id,
            type_id: self.consultation_type_id,
            start,
            notes: None,
            request_id: None,
        }
    }

    /// Default doctor and patient.
    pub fn booking_at(&self, start: DateTime<Utc>) -> BookAppointmentRequest {
        self.request(self.doctor_id, self.patient_id, start)
    }
}

pub fn monday_hours() -> SetScheduleEntryRequest {
    SetScheduleEntryRequest {
        weekday: 0,
        start_time: time(8, 0),
        end_time: time(17, 0),
        break_start: Some(time(12, 0)),
        break_end: Some(time(13, 0)),
    }
}
