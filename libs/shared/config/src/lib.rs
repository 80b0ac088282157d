use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_SLOT_GRANULARITY_MINUTES: u32 = 30;
pub const DEFAULT_BOOKING_LOCK_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_address: String,
    pub slot_granularity_minutes: u32,
    pub booking_lock_timeout_ms: u64,
    pub enforce_check_in_window: bool,
    pub directory_seed_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            slot_granularity_minutes: DEFAULT_SLOT_GRANULARITY_MINUTES,
            booking_lock_timeout_ms: DEFAULT_BOOKING_LOCK_TIMEOUT_MS,
            enforce_check_in_window: false,
            directory_seed_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| {
                    warn!("BIND_ADDRESS not set, using default {}", defaults.bind_address);
                    defaults.bind_address.clone()
                }),
            slot_granularity_minutes: parse_var(
                "SLOT_GRANULARITY_MINUTES",
                defaults.slot_granularity_minutes,
            ),
            booking_lock_timeout_ms: parse_var(
                "BOOKING_LOCK_TIMEOUT_MS",
                defaults.booking_lock_timeout_ms,
            ),
            enforce_check_in_window: parse_var(
                "ENFORCE_CHECK_IN_WINDOW",
                defaults.enforce_check_in_window,
            ),
            directory_seed_path: env::var("DIRECTORY_SEED_PATH").ok(),
        };

        if !config.is_valid() {
            warn!("Scheduling configuration has zero-valued settings, falling back to defaults");
            return Self {
                slot_granularity_minutes: defaults.slot_granularity_minutes,
                booking_lock_timeout_ms: defaults.booking_lock_timeout_ms,
                ..config
            };
        }

        config
    }

    pub fn is_valid(&self) -> bool {
        self.slot_granularity_minutes > 0 && self.booking_lock_timeout_ms > 0
    }

    pub fn has_directory_seed(&self) -> bool {
        self.directory_seed_path
            .as_deref()
            .is_some_and(|path| !path.is_empty())
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
