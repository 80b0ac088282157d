// libs/appointment-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use doctor_cell::models::{weekday_index, AvailabilityBlock, WeeklyScheduleEntry};
use doctor_cell::services::{AvailabilityBlockService, WeeklyScheduleService};
use shared_models::interval::TimeRange;
use shared_utils::clock::Clock;

use crate::models::{Appointment, AppointmentError, Slot, SlotQuery};
use crate::services::directory::Directory;
use crate::services::store::AppointmentStore;

/// Inputs of one slot computation besides the stored data.
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub duration: Duration,
    pub granularity: Duration,
    /// Candidates starting before this instant are dropped.
    pub not_before: Option<DateTime<Utc>>,
}

/// Free slots of one doctor on `request.date`.
///
/// For every schedule entry of that weekday a cursor walks from the entry start
/// in `granularity` steps while `cursor + duration` still fits the entry. A
/// candidate survives when it misses the entry's break, every block and every
/// active appointment (half-open overlap). Output is chronological and free of
/// duplicates. Pure: no I/O, no clock.
pub fn generate_slots(
    entries: &[WeeklyScheduleEntry],
    blocks: &[AvailabilityBlock],
    appointments: &[Appointment],
    request: &SlotRequest,
) -> Vec<Slot> {
    let mut slots = Vec::new();
    if request.duration <= Duration::zero() || request.granularity <= Duration::zero() {
        return slots;
    }

    let weekday = weekday_index(request.date);

    for entry in entries.iter().filter(|entry| entry.weekday == weekday) {
        let Some(window) = entry.window_on(request.date) else {
            continue;
        };
        let break_window = entry.break_on(request.date);

        let mut next = Some(window.start);
        while let Some(cursor) = next {
            let Some(candidate) = TimeRange::starting_at(cursor, request.duration)
                .filter(|candidate| candidate.end <= window.end)
            else {
                break;
            };
            next = cursor.checked_add_signed(request.granularity);

            if request.not_before.is_some_and(|not_before| candidate.start < not_before) {
                continue;
            }
            if break_window.is_some_and(|pause| pause.overlaps(&candidate)) {
                continue;
            }
            if blocks.iter().any(|block| block.range().overlaps(&candidate)) {
                continue;
            }
            if appointments
                .iter()
                .any(|appointment| appointment.is_active() && appointment.range().overlaps(&candidate))
            {
                continue;
            }

            slots.push(Slot::from(candidate));
        }
    }

    slots.sort();
    slots.dedup();
    slots
}

/// Authoritative schedule test applied at booking time.
///
/// `range` must fit inside one schedule entry of its weekday, miss that entry's
/// break and miss every block. Slot lists handed out earlier are advisory only.
pub fn check_schedule(
    entries: &[WeeklyScheduleEntry],
    blocks: &[AvailabilityBlock],
    range: &TimeRange,
) -> Result<(), AppointmentError> {
    let date = range.start.date_naive();
    let weekday = weekday_index(date);

    let entry = entries
        .iter()
        .filter(|entry| entry.weekday == weekday)
        .find(|entry| entry.window_on(date).is_some_and(|window| window.contains(range)))
        .ok_or_else(|| {
            AppointmentError::DoctorUnavailable("requested time is outside working hours".to_string())
        })?;

    if entry.break_on(date).is_some_and(|pause| pause.overlaps(range)) {
        return Err(AppointmentError::DoctorUnavailable(
            "requested time overlaps the doctor's break".to_string(),
        ));
    }

    if let Some(block) = blocks.iter().find(|block| block.range().overlaps(range)) {
        return Err(AppointmentError::DoctorUnavailable(format!(
            "doctor is blocked ({}) from {} to {}",
            block.kind, block.start, block.end
        )));
    }

    Ok(())
}

/// Read-only slot lookups. Takes no booking locks.
pub struct SlotService {
    schedule: Arc<WeeklyScheduleService>,
    blocks: Arc<AvailabilityBlockService>,
    appointments: Arc<dyn AppointmentStore>,
    directory: Arc<dyn Directory>,
    clock: Arc<dyn Clock>,
    default_granularity_minutes: u32,
}

impl SlotService {
    pub fn new(
        schedule: Arc<WeeklyScheduleService>,
        blocks: Arc<AvailabilityBlockService>,
        appointments: Arc<dyn AppointmentStore>,
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
        default_granularity_minutes: u32,
    ) -> Self {
        Self {
            schedule,
            blocks,
            appointments,
            directory,
            clock,
            default_granularity_minutes,
        }
    }

    pub async fn available_slots(
        &self,
        organization_id: Uuid,
        query: &SlotQuery,
    ) -> Result<Vec<Slot>, AppointmentError> {
        debug!("Calculating available slots for doctor {} on {}", query.doctor_id, query.date);

        self.directory.doctor(organization_id, query.doctor_id).await?;
        let appointment_type = self.directory.appointment_type(query.type_id).await?;

        let granularity_minutes = query.granularity_minutes.unwrap_or(self.default_granularity_minutes);
        if granularity_minutes == 0 {
            return Err(AppointmentError::Validation(
                "Slot granularity must be positive".to_string(),
            ));
        }
        if appointment_type.duration_minutes == 0 {
            return Err(AppointmentError::Validation(format!(
                "Appointment type {} has no duration",
                appointment_type.id
            )));
        }

        let day = TimeRange::day(query.date).ok_or_else(|| {
            AppointmentError::Validation(format!("Date {} is out of range", query.date))
        })?;

        let entries = self
            .schedule
            .entries_for(organization_id, query.doctor_id, weekday_index(query.date))
            .await?;
        if entries.is_empty() {
            debug!("Doctor {} has no working hours on {}", query.doctor_id, query.date);
            return Ok(Vec::new());
        }

        let blocks = self
            .blocks
            .blocks_overlapping(organization_id, query.doctor_id, day.start, day.end)
            .await?;
        let appointments = self
            .appointments
            .doctor_appointments_between(query.doctor_id, day.start, day.end)
            .await?;

        let slots = generate_slots(
            &entries,
            &blocks,
            &appointments,
            &SlotRequest {
                date: query.date,
                duration: appointment_type.duration(),
                granularity: Duration::minutes(i64::from(granularity_minutes)),
                not_before: Some(self.clock.now()),
            },
        );

        debug!("Found {} free slots for doctor {} on {}", slots.len(), query.doctor_id, query.date);
        Ok(slots)
    }
}
