use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::extractor::OrganizationContext;

use crate::models::{BlockQuery, CreateBlockRequest, SetScheduleEntryRequest};
use crate::router::DoctorState;

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub weekday: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct BlocksQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// ==============================================================================
// WEEKLY SCHEDULE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn set_schedule_entry(
    State(state): State<DoctorState>,
    org: OrganizationContext,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<SetScheduleEntryRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = state
        .schedule
        .set_entry(org.organization_id, doctor_id, request)
        .await?;
    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<DoctorState>,
    org: OrganizationContext,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let entries = match query.weekday {
        Some(weekday) if weekday > 6 => {
            return Err(AppError::ValidationError(
                "Weekday must be between 0 (Monday) and 6 (Sunday)".to_string(),
            ))
        }
        Some(weekday) => {
            state
                .schedule
                .entries_for(org.organization_id, doctor_id, weekday)
                .await?
        }
        None => {
            state
                .schedule
                .entries_for_doctor(org.organization_id, doctor_id)
                .await?
        }
    };

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "entries": entries,
        "total": entries.len()
    })))
}

#[axum::debug_handler]
pub async fn remove_schedule_entry(
    State(state): State<DoctorState>,
    org: OrganizationContext,
    Path((doctor_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let removed = state
        .schedule
        .remove_entry(org.organization_id, doctor_id, entry_id)
        .await?;
    Ok(Json(json!({
        "removed": removed
    })))
}

// ==============================================================================
// AVAILABILITY BLOCK HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_block(
    State(state): State<DoctorState>,
    org: OrganizationContext,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<CreateBlockRequest>,
) -> Result<Json<Value>, AppError> {
    let block = state
        .blocks
        .create(org.organization_id, doctor_id, request)
        .await?;
    Ok(Json(json!(block)))
}

#[axum::debug_handler]
pub async fn get_blocks(
    State(state): State<DoctorState>,
    org: OrganizationContext,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<BlocksQuery>,
) -> Result<Json<Value>, AppError> {
    let range = match (query.from, query.to, query.date) {
        (Some(from), Some(to), _) => BlockQuery { from, to },
        (None, None, Some(date)) => BlockQuery::for_date(date)?,
        _ => {
            return Err(AppError::BadRequest(
                "Either date or from/to must be provided".to_string(),
            ))
        }
    };

    let blocks = state
        .blocks
        .blocks_overlapping(org.organization_id, doctor_id, range.from, range.to)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "blocks": blocks,
        "total": blocks.len()
    })))
}

#[axum::debug_handler]
pub async fn remove_block(
    State(state): State<DoctorState>,
    org: OrganizationContext,
    Path((doctor_id, block_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let removed = state
        .blocks
        .remove(org.organization_id, doctor_id, block_id)
        .await?;
    Ok(Json(json!({
        "removed": removed
    })))
}
