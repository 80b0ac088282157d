use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use shared_models::error::AppError;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Tenant scope of a request, taken from the `x-organization-id` header.
///
/// Every scheduling call receives the organisation explicitly; nothing is
/// read from ambient request state further down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizationContext {
    pub organization_id: Uuid,
}

impl<S> FromRequestParts<S> for OrganizationContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ORGANIZATION_HEADER)
            .ok_or_else(|| AppError::BadRequest("Missing x-organization-id header".to_string()))?;

        let raw = header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid x-organization-id header".to_string()))?;

        let organization_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::BadRequest("x-organization-id must be a UUID".to_string()))?;

        Ok(Self { organization_id })
    }
}
