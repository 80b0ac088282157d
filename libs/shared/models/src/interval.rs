use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open overlap test for `[a_start, a_end)` and `[b_start, b_end)`.
///
/// Touching endpoints (`a_end == b_start`) do not overlap. Generic so the same
/// predicate serves instants and weekly wall-clock times.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// A half-open `[start, end)` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Returns `None` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// `None` for a non-positive `length` or an end past the last
    /// representable instant.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Option<Self> {
        Self::new(start, start.checked_add_signed(length)?)
    }

    /// The calendar day `date` in UTC: `[date 00:00, date+1 00:00)`.
    ///
    /// `None` for the last representable date, whose end cannot be expressed.
    pub fn day(date: NaiveDate) -> Option<Self> {
        Self::starting_at(date.and_time(NaiveTime::MIN).and_utc(), Duration::days(1))
    }

    /// Combines a date with two wall-clock times.
    pub fn on_date(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Option<Self> {
        Self::new(date.and_time(start).and_utc(), date.and_time(end).and_utc())
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
