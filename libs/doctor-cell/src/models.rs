use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveTime, NaiveDate, Datelike};
use std::fmt;

use shared_models::interval::{overlaps, TimeRange};

// ==============================================================================
// WEEKLY SCHEDULE
// ==============================================================================

/// Recurring work window of a doctor on one weekday (0 = Monday .. 6 = Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyScheduleEntry {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklyScheduleEntry {
    pub fn has_break(&self) -> bool {
        self.break_start.is_some() && self.break_end.is_some()
    }

    /// Half-open overlap of the two work windows, ignoring breaks.
    pub fn overlaps(&self, start_time: NaiveTime, end_time: NaiveTime) -> bool {
        overlaps(self.start_time, self.end_time, start_time, end_time)
    }

    /// The work window on a concrete date.
    pub fn window_on(&self, date: NaiveDate) -> Option<TimeRange> {
        TimeRange::on_date(date, self.start_time, self.end_time)
    }

    pub fn break_on(&self, date: NaiveDate) -> Option<TimeRange> {
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => TimeRange::on_date(date, start, end),
            _ => None,
        }
    }
}

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

pub fn weekday_name(weekday: &u8) -> &'static str {
    WEEKDAY_NAMES.get(usize::from(*weekday)).copied().unwrap_or("unknown day")
}

/// Weekday index used by the schedule: 0 = Monday .. 6 = Sunday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetScheduleEntryRequest {
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
}

impl SetScheduleEntryRequest {
    pub fn validate(&self) -> Result<(), DoctorError> {
        if self.weekday > 6 {
            return Err(DoctorError::Validation(
                "Weekday must be between 0 (Monday) and 6 (Sunday)".to_string(),
            ));
        }

        if self.start_time >= self.end_time {
            return Err(DoctorError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }

        match (self.break_start, self.break_end) {
            (None, None) => Ok(()),
            (Some(break_start), Some(break_end)) => {
                if break_start >= break_end {
                    return Err(DoctorError::Validation(
                        "Break start must be before break end".to_string(),
                    ));
                }
                if break_start < self.start_time || break_end > self.end_time {
                    return Err(DoctorError::Validation(
                        "Break must lie within the working hours".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Err(DoctorError::Validation(
                "Break start and break end must be given together".to_string(),
            )),
        }
    }
}

// ==============================================================================
// AVAILABILITY BLOCKS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Vacation,
    Conference,
    Surgery,
    SickLeave,
    Personal,
    #[default]
    Other,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Vacation => write!(f, "vacation"),
            BlockKind::Conference => write!(f, "conference"),
            BlockKind::Surgery => write!(f, "surgery"),
            BlockKind::SickLeave => write!(f, "sick_leave"),
            BlockKind::Personal => write!(f, "personal"),
            BlockKind::Other => write!(f, "other"),
        }
    }
}

/// Ad-hoc interval during which a doctor cannot be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: BlockKind,
    pub all_day: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityBlock {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlockRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub all_day: bool,
    pub reason: Option<String>,
}

impl CreateBlockRequest {
    /// Validated interval of the block; all-day blocks are widened to whole
    /// calendar days.
    pub fn effective_range(&self) -> Result<TimeRange, DoctorError> {
        let (start, end) = if self.all_day {
            let start = self.start.date_naive().and_time(NaiveTime::MIN).and_utc();
            let end_day_start = self.end.date_naive().and_time(NaiveTime::MIN).and_utc();
            let end = if self.end == end_day_start {
                self.end
            } else {
                TimeRange::day(self.end.date_naive())
                    .ok_or_else(|| {
                        DoctorError::Validation("Block end is out of range".to_string())
                    })?
                    .end
            };
            (start, end)
        } else {
            (self.start, self.end)
        };

        TimeRange::new(start, end).ok_or_else(|| {
            DoctorError::Validation("Block start must be before block end".to_string())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl BlockQuery {
    pub fn for_date(date: NaiveDate) -> Result<Self, DoctorError> {
        let day = TimeRange::day(date)
            .ok_or_else(|| DoctorError::Validation(format!("Date {} is out of range", date)))?;
        Ok(Self { from: day.start, to: day.end })
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum DoctorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schedule entry overlaps existing hours {existing_start}-{existing_end} on {}", weekday_name(.weekday))]
    ScheduleOverlap {
        weekday: u8,
        existing_start: NaiveTime,
        existing_end: NaiveTime,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DoctorError> for shared_models::error::AppError {
    fn from(error: DoctorError) -> Self {
        use shared_models::error::AppError;

        match error {
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            overlap @ DoctorError::ScheduleOverlap { .. } => AppError::Conflict(overlap.to_string()),
            DoctorError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            DoctorError::Storage(msg) => AppError::Storage(msg),
        }
    }
}
