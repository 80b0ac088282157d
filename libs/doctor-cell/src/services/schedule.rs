use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{DoctorError, SetScheduleEntryRequest, WeeklyScheduleEntry};
use crate::services::lookup::DoctorLookup;
use crate::services::store::ScheduleStore;

/// Recurring weekly working hours per doctor.
///
/// Every call names the organisation and is refused for doctors outside it.
pub struct WeeklyScheduleService {
    store: Arc<dyn ScheduleStore>,
    doctors: Arc<dyn DoctorLookup>,
    // Serializes check-then-write so concurrent edits cannot both pass the overlap test.
    writes: Mutex<()>,
}

impl WeeklyScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>, doctors: Arc<dyn DoctorLookup>) -> Self {
        Self {
            store,
            doctors,
            writes: Mutex::new(()),
        }
    }

    /// Create or replace the entry starting at `request.start_time` on
    /// `request.weekday`.
    pub async fn set_entry(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
        request: SetScheduleEntryRequest,
    ) -> Result<WeeklyScheduleEntry, DoctorError> {
        debug!("Setting schedule entry for doctor {} on weekday {}", doctor_id, request.weekday);

        self.doctors.ensure_doctor(organization_id, doctor_id).await?;
        request.validate()?;

        let _guard = self.writes.lock().await;
        let existing = self.store.entries_for(doctor_id, request.weekday).await?;

        let replaced = existing
            .iter()
            .find(|entry| entry.start_time == request.start_time);

        if let Some(clash) = existing.iter().find(|entry| {
            entry.start_time != request.start_time
                && entry.overlaps(request.start_time, request.end_time)
        }) {
            warn!("Schedule entry for doctor {} overlaps {}-{}",
                  doctor_id, clash.start_time, clash.end_time);
            return Err(DoctorError::ScheduleOverlap {
                weekday: request.weekday,
                existing_start: clash.start_time,
                existing_end: clash.end_time,
            });
        }

        let now = Utc::now();
        let entry = WeeklyScheduleEntry {
            id: replaced.map(|entry| entry.id).unwrap_or_else(Uuid::new_v4),
            doctor_id,
            weekday: request.weekday,
            start_time: request.start_time,
            end_time: request.end_time,
            break_start: request.break_start,
            break_end: request.break_end,
            created_at: replaced.map(|entry| entry.created_at).unwrap_or(now),
            updated_at: now,
        };

        let stored = self.store.upsert_entry(entry).await?;
        info!("Schedule entry {} stored for doctor {}", stored.id, doctor_id);
        Ok(stored)
    }

    /// Entries for one weekday ordered by start time (normally zero or one).
    pub async fn entries_for(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
        weekday: u8,
    ) -> Result<Vec<WeeklyScheduleEntry>, DoctorError> {
        self.doctors.ensure_doctor(organization_id, doctor_id).await?;
        self.store.entries_for(doctor_id, weekday).await
    }

    pub async fn entries_for_doctor(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Vec<WeeklyScheduleEntry>, DoctorError> {
        self.doctors.ensure_doctor(organization_id, doctor_id).await?;
        self.store.entries_for_doctor(doctor_id).await
    }

    pub async fn remove_entry(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
        entry_id: Uuid,
    ) -> Result<WeeklyScheduleEntry, DoctorError> {
        self.doctors.ensure_doctor(organization_id, doctor_id).await?;
        let _guard = self.writes.lock().await;
        let removed = self.store.remove_entry(doctor_id, entry_id).await?;
        info!("Schedule entry {} removed for doctor {}", entry_id, doctor_id);
        Ok(removed)
    }
}
