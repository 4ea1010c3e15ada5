use room_core::{IdPolicy, RoomCleanup, RoomStoreConfig};
use std::env;
use std::fmt::Debug;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::websocket::rate_limiter::RateLimiter;

// One year; longer periods overflow timer deadlines
const MAX_SECONDS: u64 = 365 * 24 * 60 * 60;
const MAX_MINUTES: u64 = MAX_SECONDS / 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub message_retention: usize,
    pub id_length: usize,
    pub max_id_attempts: u32,
    pub room_idle_timeout_minutes: u64,
    pub room_offline_grace_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub connection_timeout_seconds: u64,
    pub rate_limit_burst: u32,
    pub rate_limit_refill_ms: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080),
            message_retention: env_or("MESSAGE_RETENTION", 100),
            id_length: env_in("ID_LENGTH", 8, 1..=64),
            max_id_attempts: env_in("MAX_ID_ATTEMPTS", 10, 1..=1000),
            room_idle_timeout_minutes: env_in("ROOM_IDLE_TIMEOUT_MINUTES", 60, 1..=MAX_MINUTES),
            room_offline_grace_seconds: env_in("ROOM_OFFLINE_GRACE_SECONDS", 300, 0..=MAX_SECONDS),
            cleanup_interval_seconds: env_in("CLEANUP_INTERVAL_SECONDS", 30, 1..=MAX_SECONDS),
            connection_timeout_seconds: env_in("CONNECTION_TIMEOUT_SECONDS", 300, 1..=MAX_SECONDS),
            rate_limit_burst: env_in("RATE_LIMIT_BURST", 30, 1..=u32::MAX),
            rate_limit_refill_ms: env_in("RATE_LIMIT_REFILL_MS", 500, 1..=MAX_SECONDS * 1000),
        }
    }

    pub fn room_store_config(&self) -> RoomStoreConfig {
        RoomStoreConfig {
            message_retention: self.message_retention,
            ids: IdPolicy {
                length: self.id_length,
                max_attempts: self.max_id_attempts,
            },
        }
    }

    pub fn room_cleanup(&self) -> RoomCleanup {
        RoomCleanup::new(
            Duration::from_secs(self.room_idle_timeout_minutes.saturating_mul(60)),
            Duration::from_secs(self.room_offline_grace_seconds),
        )
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new_with_limits(
            self.rate_limit_burst,
            Duration::from_millis(self.rate_limit_refill_ms),
        )
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(key, env::var(key).ok().as_deref(), default)
}

fn env_in<T: FromStr + PartialOrd + Debug>(key: &str, default: T, range: RangeInclusive<T>) -> T {
    parse_in(key, env::var(key).ok().as_deref(), default, range)
}

/// Parse a raw setting, keeping the default when it is absent or malformed
fn parse_or<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid {} value {:?}, using default", key, raw);
            default
        }
    }
}

/// Like `parse_or`, but values outside `range` also fall back to the default
fn parse_in<T: FromStr + PartialOrd + Debug>(
    key: &str,
    raw: Option<&str>,
    default: T,
    range: RangeInclusive<T>,
) -> T {
    let Some(value) = raw.and_then(|raw| raw.trim().parse::<T>().ok()) else {
        return parse_or(key, raw, default);
    };

    if range.contains(&value) {
        value
    } else {
        warn!(
            "{} value {:?} outside {:?}, using default",
            key, value, range
        );
        default
    }
}
