//! # Weather Station Simulator
//!
//! A stand-in for a physical weather station in a larger fleet. Every cycle
//! the station draws a temperature and humidity reading, occasionally injects
//! a sensor malfunction, and publishes the reading as JSON on the shared
//! `weather` MQTT topic. With a small per-cycle probability the simulated
//! device fails for good and the loop ends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weather_station::{
//!     MqttPublisher, RngSource, StationConfig, SystemClock, WeatherStation,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StationConfig::from_env()?;
//! let publisher = MqttPublisher::connect(&config.broker);
//! let mut station = WeatherStation::new(config, publisher, SystemClock, RngSource::from_entropy());
//!
//! let stats = station.run().await?;
//! println!("station stopped after {} readings", stats.readings_published);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`station`] - The produce-and-publish loop and its two-state lifecycle
//! - [`fault_injection`] - Seedable random source and the fault model
//! - [`reading`] - The reading record and its wire format
//! - [`validation`] - Plausibility predicates for readings and raw payloads
//! - [`publisher`] - Telemetry delivery (MQTT, dry-run, in-memory)
//! - [`clock`] - Wall-clock time and the inter-cycle delay
//! - [`config`] - Startup configuration from the environment

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod clock;
pub mod config;
pub mod fault_injection;
pub mod publisher;
pub mod reading;
pub mod station;
pub mod validation;

// Re-export main public types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, StationConfig};
pub use fault_injection::{FaultModel, RandomSource, RngSource};
pub use publisher::{LogPublisher, MemoryPublisher, MqttPublisher, PublishError, TelemetryPublisher};
pub use reading::Reading;
pub use station::{CycleOutcome, StationError, StationState, StationStats, WeatherStation};
pub use validation::{validate_humidity, validate_temperature};
