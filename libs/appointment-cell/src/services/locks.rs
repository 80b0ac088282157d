use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::AppointmentError;

/// One async mutex per key, created on first use.
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, key: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Held for the check + write of one appointment mutation. Dropping it
/// releases every section it holds.
#[derive(Debug)]
pub struct SchedulingGuard {
    _doctor: OwnedMutexGuard<()>,
    _patient: Option<OwnedMutexGuard<()>>,
}

/// Exclusive sections keyed by doctor and by patient.
///
/// The doctor section is always taken before the patient section, so two
/// callers can never wait on each other.
pub struct SchedulingLocks {
    doctors: KeyedLocks,
    patients: KeyedLocks,
    timeout: Duration,
}

impl SchedulingLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            doctors: KeyedLocks::default(),
            patients: KeyedLocks::default(),
            timeout,
        }
    }

    /// Doctor section only, for status changes that do not move the
    /// appointment in time.
    pub async fn acquire_doctor(&self, doctor_id: Uuid) -> Result<SchedulingGuard, AppointmentError> {
        let doctor = tokio::time::timeout(self.timeout, self.doctors.lock(doctor_id))
            .await
            .map_err(|_| self.timed_out(doctor_id))?;

        debug!("Scheduling lock acquired for doctor {}", doctor_id);
        Ok(SchedulingGuard {
            _doctor: doctor,
            _patient: None,
        })
    }

    /// Doctor then patient section, both within one timeout budget.
    pub async fn acquire(&self, doctor_id: Uuid, patient_id: Uuid) -> Result<SchedulingGuard, AppointmentError> {
        let acquire_both = async {
            let doctor = self.doctors.lock(doctor_id).await;
            let patient = self.patients.lock(patient_id).await;
            (doctor, patient)
        };

        let (doctor, patient) = tokio::time::timeout(self.timeout, acquire_both)
            .await
            .map_err(|_| self.timed_out(doctor_id))?;

        debug!("Scheduling locks acquired for doctor {} and patient {}", doctor_id, patient_id);
        Ok(SchedulingGuard {
            _doctor: doctor,
            _patient: Some(patient),
        })
    }

    fn timed_out(&self, doctor_id: Uuid) -> AppointmentError {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        warn!("Timed out after {} ms waiting for scheduling lock of doctor {}", timeout_ms, doctor_id);
        AppointmentError::Timeout { timeout_ms }
    }
}
