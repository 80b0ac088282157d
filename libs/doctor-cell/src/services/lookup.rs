use async_trait::async_trait;
use uuid::Uuid;

use crate::models::DoctorError;

/// Confirms that an id names a doctor of the calling organisation.
///
/// Implemented by the collaborator that owns practitioner identity. Ids of
/// other organisations, unknown ids and practitioners without the doctor role
/// all come back as `NotFound`.
#[async_trait]
pub trait DoctorLookup: Send + Sync {
    async fn ensure_doctor(&self, organization_id: Uuid, doctor_id: Uuid) -> Result<(), DoctorError>;
}
