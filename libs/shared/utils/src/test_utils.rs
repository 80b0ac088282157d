use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use shared_config::AppConfig;

pub struct TestConfig {
    pub slot_granularity_minutes: u32,
    pub booking_lock_timeout_ms: u64,
    pub enforce_check_in_window: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: 30,
            booking_lock_timeout_ms: 2_000,
            enforce_check_in_window: false,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            bind_address: "127.0.0.1:0".to_string(),
            slot_granularity_minutes: self.slot_granularity_minutes,
            booking_lock_timeout_ms: self.booking_lock_timeout_ms,
            enforce_check_in_window: self.enforce_check_in_window,
            directory_seed_path: None,
        }
    }
}

/// Builds a UTC instant, panicking on an impossible date (test helper).
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid test timestamp")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid test time")
}
