//! Application-level configuration loading, including room lifetime and realtime tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "VOTEM_BACK_CONFIG_PATH";
/// Environment variable that overrides the public base URL used in share links.
const PUBLIC_URL_ENV: &str = "VOTEM_BACK_PUBLIC_URL";

/// Fixed lifetime of a room from creation to expiry.
const DEFAULT_ROOM_LIFETIME_SECS: u64 = 30 * 60;
/// Capacity of the per-room broadcast channels behind the event bus.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 16;
/// Inactivity window after which a live connection is considered stale.
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5 * 60;
/// How often the stale-connection sweep runs.
const DEFAULT_CONNECTION_SWEEP_SECS: u64 = 60;
/// How often an open SSE session re-checks its room's wall-clock expiry.
const DEFAULT_EXPIRY_CHECK_SECS: u64 = 60;
/// How often expired rooms are purged from the store.
const DEFAULT_ROOM_PURGE_SECS: u64 = 60;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Base URL used to build shareable room links.
    pub public_base_url: String,
    /// Lifetime of a room from creation to expiry.
    pub room_lifetime: Duration,
    /// Capacity of the per-room broadcast channels.
    pub event_channel_capacity: usize,
    /// Inactivity timeout for live connections.
    pub connection_timeout: Duration,
    /// Interval of the stale-connection sweep.
    pub connection_sweep_interval: Duration,
    /// Interval at which open sessions re-check room expiry.
    pub expiry_check_interval: Duration,
    /// Interval of the expired-room purge.
    pub room_purge_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8080".into(),
            room_lifetime: Duration::from_secs(DEFAULT_ROOM_LIFETIME_SECS),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            connection_timeout: Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS),
            connection_sweep_interval: Duration::from_secs(DEFAULT_CONNECTION_SWEEP_SECS),
            expiry_check_interval: Duration::from_secs(DEFAULT_EXPIRY_CHECK_SECS),
            room_purge_interval: Duration::from_secs(DEFAULT_ROOM_PURGE_SECS),
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Ok(url) = env::var(PUBLIC_URL_ENV) {
            config.public_base_url = url;
        }

        config
    }
}

/// Raw shape of the on-disk configuration; every field is optional.
#[derive(Debug, Deserialize)]
struct RawConfig {
    public_base_url: Option<String>,
    room_lifetime_secs: Option<u64>,
    event_channel_capacity: Option<usize>,
    connection_timeout_secs: Option<u64>,
    connection_sweep_secs: Option<u64>,
    expiry_check_secs: Option<u64>,
    room_purge_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            public_base_url: raw.public_base_url.unwrap_or(defaults.public_base_url),
            room_lifetime: raw
                .room_lifetime_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.room_lifetime),
            event_channel_capacity: raw
                .event_channel_capacity
                .unwrap_or(defaults.event_channel_capacity),
            connection_timeout: raw
                .connection_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connection_timeout),
            connection_sweep_interval: raw
                .connection_sweep_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connection_sweep_interval),
            expiry_check_interval: raw
                .expiry_check_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.expiry_check_interval),
            room_purge_interval: raw
                .room_purge_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.room_purge_interval),
        }
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.room_lifetime, Duration::from_secs(1800));
        assert_eq!(config.connection_timeout, Duration::from_secs(300));
    }

    #[test]
    fn raw_config_overrides_only_present_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "room_lifetime_secs": 60, "public_base_url": "https://vote.example" }"#)
                .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.room_lifetime, Duration::from_secs(60));
        assert_eq!(config.public_base_url, "https://vote.example");
        assert_eq!(config.connection_timeout, Duration::from_secs(300));
    }
}
