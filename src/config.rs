//! Station configuration, resolved once at startup.
//!
//! Values come from the process environment (`STATION_ID`, `INTERVAL`,
//! `MQTT_BROKER`, `MQTT_PORT`, `SIM_SEED`); the binary may override them from
//! the command line. The resulting [`StationConfig`] is immutable for the
//! lifetime of the station.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_STATION_ID: &str = "WS-XX";
pub const DEFAULT_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_BROKER_HOST: &str = "mosquitto";
pub const DEFAULT_BROKER_PORT: u16 = 1883;
pub const DEFAULT_KEEP_ALIVE_SECONDS: u64 = 60;
pub const TELEMETRY_TOPIC: &str = "weather";

pub const ENV_STATION_ID: &str = "STATION_ID";
pub const ENV_INTERVAL: &str = "INTERVAL";
pub const ENV_BROKER_HOST: &str = "MQTT_BROKER";
pub const ENV_BROKER_PORT: &str = "MQTT_PORT";
pub const ENV_SEED: &str = "SIM_SEED";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("station id must not be empty")]
    EmptyStationId,
    #[error("invalid interval {0:?}: expected a positive whole number of seconds")]
    InvalidInterval(String),
    #[error("invalid broker port {0:?}")]
    InvalidPort(String),
    #[error("invalid seed {0:?}: expected an unsigned integer")]
    InvalidSeed(String),
}

/// Raw command-line values. `None` keeps whatever the environment resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub station_id: Option<String>,
    pub interval: Option<String>,
    pub broker_host: Option<String>,
    pub broker_port: Option<String>,
    pub seed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationConfig {
    pub station_id: String,
    pub interval: Duration,
    pub topic: String,
    pub broker: BrokerConfig,
    /// Fixed seed for a reproducible run; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STATION_ID)
    }
}

impl StationConfig {
    pub fn new(station_id: impl Into<String>) -> Self {
        let station_id = station_id.into();
        Self {
            broker: BrokerConfig {
                host: DEFAULT_BROKER_HOST.to_string(),
                port: DEFAULT_BROKER_PORT,
                keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECONDS),
                client_id: station_id.clone(),
            },
            station_id,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECONDS),
            topic: TELEMETRY_TOPIC.to_string(),
            seed: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup`, falling back to defaults for
    /// unset keys. Set-but-invalid values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let station_id = match lookup(ENV_STATION_ID) {
            Some(id) => parse_station_id(&id)?,
            None => DEFAULT_STATION_ID.to_string(),
        };
        let mut config = Self::new(station_id);

        if let Some(raw) = lookup(ENV_INTERVAL) {
            config.interval = parse_interval(&raw)?;
        }
        if let Some(host) = lookup(ENV_BROKER_HOST) {
            config.broker.host = host;
        }
        if let Some(raw) = lookup(ENV_BROKER_PORT) {
            config.broker.port = parse_port(&raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            config.seed = Some(parse_seed(&raw)?);
        }

        Ok(config)
    }

    /// Replace the station id, keeping the MQTT client id in step with it.
    pub fn set_station_id(&mut self, raw: &str) -> Result<(), ConfigError> {
        let station_id = parse_station_id(raw)?;
        self.broker.client_id.clone_from(&station_id);
        self.station_id = station_id;
        Ok(())
    }

    /// Layer command-line values over the resolved configuration. Nothing is
    /// changed unless every supplied value parses.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        let mut merged = self.clone();

        if let Some(id) = &overrides.station_id {
            merged.set_station_id(id)?;
        }
        if let Some(raw) = &overrides.interval {
            merged.interval = parse_interval(raw)?;
        }
        if let Some(host) = &overrides.broker_host {
            merged.broker.host.clone_from(host);
        }
        if let Some(raw) = &overrides.broker_port {
            merged.broker.port = parse_port(raw)?;
        }
        if let Some(raw) = &overrides.seed {
            merged.seed = Some(parse_seed(raw)?);
        }

        *self = merged;
        Ok(())
    }

    pub fn broker_address(&self) -> String {
        format!("{}:{}", self.broker.host, self.broker.port)
    }
}

pub fn parse_station_id(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyStationId);
    }
    Ok(trimmed.to_string())
}

pub fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::InvalidInterval(raw.to_string())),
    }
}

pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(raw.to_string())),
    }
}

pub fn parse_seed(raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidSeed(raw.to_string()))
}
