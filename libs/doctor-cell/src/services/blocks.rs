use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{AvailabilityBlock, CreateBlockRequest, DoctorError};
use crate::services::lookup::DoctorLookup;
use crate::services::store::BlockStore;

/// Ad-hoc unavailability (vacation, conference, surgery...).
///
/// Blocks are additive: several may cover the same time without error.
pub struct AvailabilityBlockService {
    store: Arc<dyn BlockStore>,
    doctors: Arc<dyn DoctorLookup>,
}

impl AvailabilityBlockService {
    pub fn new(store: Arc<dyn BlockStore>, doctors: Arc<dyn DoctorLookup>) -> Self {
        Self { store, doctors }
    }

    pub async fn create(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
        request: CreateBlockRequest,
    ) -> Result<AvailabilityBlock, DoctorError> {
        self.doctors.ensure_doctor(organization_id, doctor_id).await?;
        let range = request.effective_range()?;

        let block = AvailabilityBlock {
            id: Uuid::new_v4(),
            doctor_id,
            start: range.start,
            end: range.end,
            kind: request.kind,
            all_day: request.all_day,
            reason: request.reason,
            created_at: Utc::now(),
        };

        let stored = self.store.insert_block(block).await?;
        info!("{} block {} created for doctor {} ({} - {})",
              stored.kind, stored.id, doctor_id, stored.start, stored.end);
        Ok(stored)
    }

    /// Blocks whose interval intersects `[start, end)`.
    pub async fn blocks_overlapping(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AvailabilityBlock>, DoctorError> {
        debug!("Fetching blocks for doctor {} between {} and {}", doctor_id, start, end);

        if start >= end {
            return Err(DoctorError::Validation(
                "Query start must be before query end".to_string(),
            ));
        }

        self.doctors.ensure_doctor(organization_id, doctor_id).await?;
        self.store.blocks_overlapping(doctor_id, start, end).await
    }

    pub async fn remove(
        &self,
        organization_id: Uuid,
        doctor_id: Uuid,
        block_id: Uuid,
    ) -> Result<AvailabilityBlock, DoctorError> {
        self.doctors.ensure_doctor(organization_id, doctor_id).await?;
        let removed = self.store.remove_block(doctor_id, block_id).await?;
        info!("Block {} removed for doctor {}", block_id, doctor_id);
        Ok(removed)
    }
}
