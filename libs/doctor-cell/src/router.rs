use std::sync::Arc;

use axum::{
    Router,
    routing::{get, delete},
};

use crate::handlers;
use crate::services::{AvailabilityBlockService, WeeklyScheduleService};

#[derive(Clone)]
pub struct DoctorState {
    pub schedule: Arc<WeeklyScheduleService>,
    pub blocks: Arc<AvailabilityBlockService>,
}

pub fn doctor_routes(state: DoctorState) -> Router {
    Router::new()
        // Recurring weekly hours
        .route("/{doctor_id}/schedule", get(handlers::get_schedule).put(handlers::set_schedule_entry))
        .route("/{doctor_id}/schedule/{entry_id}", delete(handlers::remove_schedule_entry))

        // Ad-hoc unavailability
        .route("/{doctor_id}/blocks", get(handlers::get_blocks).post(handlers::create_block))
        .route("/{doctor_id}/blocks/{block_id}", delete(handlers::remove_block))
        .with_state(state)
}
