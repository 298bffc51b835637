use std::{env, time::Duration};

use chrono::TimeDelta;
use tracing::warn;

use super::grade::GradeThresholds;

const DEFAULT_AUCTION_DURATION_SECS: u64 = 86_400;
const DEFAULT_AUCTION_STALL_WINDOW_SECS: u64 = 14_400;
const DEFAULT_AUCTION_MAX_EXTENSIONS: u32 = 3;
const DEFAULT_AUCTION_SWEEP_INTERVAL_SECS: u64 = 60;
const MAX_WINDOW_SECS: u64 = 365 * 86_400;

#[derive(Debug, Clone)]
pub struct AuctionConfig {
    /// Planned length of a freshly opened auction.
    pub duration: Duration,
    /// Idle time that triggers an extension, and the size of each extension.
    pub stall_window: Duration,
    pub max_extensions: u32,
    pub sweep_interval: Duration,
    pub grade_thresholds: GradeThresholds,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(DEFAULT_AUCTION_DURATION_SECS),
            stall_window: Duration::from_secs(DEFAULT_AUCTION_STALL_WINDOW_SECS),
            max_extensions: DEFAULT_AUCTION_MAX_EXTENSIONS,
            sweep_interval: Duration::from_secs(DEFAULT_AUCTION_SWEEP_INTERVAL_SECS),
            grade_thresholds: GradeThresholds::default(),
        }
    }
}

impl AuctionConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|name| env::var(name).ok())
    }

    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let thresholds = GradeThresholds::default();
        let c = read_env_i64("GRADE_C_MIN_POINTS", thresholds.c, &get_env);
        let b = read_env_i64("GRADE_B_MIN_POINTS", thresholds.b, &get_env);
        let a = read_env_i64("GRADE_A_MIN_POINTS", thresholds.a, &get_env);
        let grade_thresholds = GradeThresholds::new(c, b, a).unwrap_or_else(|| {
            warn!(
                "Grade thresholds C={c} B={b} A={a} must be strictly increasing and positive. \
                 Using defaults."
            );
            thresholds
        });

        Self {
            duration: read_env_window(
                "AUCTION_DURATION_SECS",
                defaults.duration,
                &get_env,
            ),
            stall_window: read_env_window(
                "AUCTION_STALL_WINDOW_SECS",
                defaults.stall_window,
                &get_env,
            ),
            max_extensions: read_env_u32(
                "AUCTION_MAX_EXTENSIONS",
                defaults.max_extensions,
                &get_env,
            ),
            sweep_interval: read_env_window(
                "AUCTION_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval,
                &get_env,
            ),
            grade_thresholds,
        }
    }

    pub fn duration_delta(&self) -> TimeDelta {
        to_delta(self.duration)
    }

    pub fn stall_window_delta(&self) -> TimeDelta {
        to_delta(self.stall_window)
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::seconds(MAX_WINDOW_SECS as i64))
}

fn read_env_i64<F>(name: &str, default: i64, get_env: &F) -> i64
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.trim().parse::<i64>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Invalid {name}='{value}': {err}. Using default {default}.");
                default
            }
        },
        None => default,
    }
}

fn read_env_u32<F>(name: &str, default: u32, get_env: &F) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.trim().parse::<u32>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Invalid {name}='{value}': {err}. Using default {default}.");
                default
            }
        },
        None => default,
    }
}

/// Seconds in `1..=MAX_WINDOW_SECS`; anything else falls back to `default`.
fn read_env_window<F>(name: &str, default: Duration, get_env: &F) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(0) => {
                warn!(
                    "{name} set to 0. Using default {}.",
                    default.as_secs()
                );
                default
            }
            Ok(parsed) if parsed > MAX_WINDOW_SECS => {
                warn!(
                    "{name}={parsed} exceeds {MAX_WINDOW_SECS}. Using default {}.",
                    default.as_secs()
                );
                default
            }
            Ok(parsed) => Duration::from_secs(parsed),
            Err(err) => {
                warn!(
                    "Invalid {name}='{value}': {err}. Using default {}.",
                    default.as_secs()
                );
                default
            }
        },
        None => default,
    }
}
