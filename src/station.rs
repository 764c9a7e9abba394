use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::StationConfig;
use crate::fault_injection::{CycleDraw, FaultInjector, FaultModel, RandomSource};
use crate::publisher::TelemetryPublisher;
use crate::reading::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationState {
    Running,
    /// Simulated permanent device failure. Nothing leaves this state.
    Terminated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A reading was built and handed to the publisher.
    Emitted(Reading),
    /// The station is dead; no reading was produced.
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StationStats {
    pub cycles: u64,
    pub readings_published: u64,
    pub publish_failures: u64,
    pub sensor_faults: u64,
}

#[derive(Debug, Error)]
pub enum StationError {
    #[error("failed to serialize reading: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Simulated weather station: draws a reading each cycle, publishes it and
/// waits out the configured interval.
pub struct WeatherStation<P, C, R> {
    config: StationConfig,
    publisher: P,
    clock: C,
    fault_injector: FaultInjector<R>,
    state: StationState,
    stats: StationStats,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<P, C, R> WeatherStation<P, C, R>
where
    P: TelemetryPublisher,
    C: Clock,
    R: RandomSource + Send,
{
    pub fn new(config: StationConfig, publisher: P, clock: C, rng: R) -> Self {
        Self::with_fault_model(config, publisher, clock, rng, FaultModel::default())
    }

    pub fn with_fault_model(
        config: StationConfig,
        publisher: P,
        clock: C,
        rng: R,
        model: FaultModel,
    ) -> Self {
        Self {
            config,
            publisher,
            clock,
            fault_injector: FaultInjector::new_with_model(model, rng),
            state: StationState::Running,
            stats: StationStats::default(),
            last_timestamp: None,
        }
    }

    /// Run one produce-and-publish cycle without the trailing delay.
    ///
    /// Once terminated, every call returns [`CycleOutcome::Terminated`]
    /// without drawing, publishing or logging.
    pub async fn step(&mut self) -> Result<CycleOutcome, StationError> {
        if self.state == StationState::Terminated {
            return Ok(CycleOutcome::Terminated);
        }

        self.stats.cycles += 1;

        let sample = match self.fault_injector.draw_cycle() {
            CycleDraw::Sample(sample) => sample,
            CycleDraw::TerminalFailure => {
                self.terminate();
                return Ok(CycleOutcome::Terminated);
            }
        };

        let timestamp = self.capture_timestamp();
        let reading = Reading::new(
            self.config.station_id.as_str(),
            sample.temperature,
            sample.humidity,
            timestamp,
        );

        if sample.malfunction {
            self.stats.sensor_faults += 1;
        }
        let flag = if sample.malfunction { " (sensor malfunction)" } else { "" };

        let payload = reading.to_json()?;
        match self
            .publisher
            .publish(&self.config.topic, payload.as_bytes())
            .await
        {
            Ok(()) => {
                self.stats.readings_published += 1;
                info!("[{}] Published: {}{}", self.config.station_id, payload, flag);
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                warn!("[{}] Failed to publish {}{}: {}", self.config.station_id, payload, flag, e);
            }
        }

        Ok(CycleOutcome::Emitted(reading))
    }

    /// Cycle until the simulated device fails, sleeping `interval` after
    /// every emitted reading.
    pub async fn run(&mut self) -> Result<StationStats, StationError> {
        info!(
            "[{}] Station online, publishing to '{}' every {}s",
            self.config.station_id,
            self.config.topic,
            self.config.interval.as_secs()
        );

        while let CycleOutcome::Emitted(_) = self.step().await? {
            self.clock.sleep(self.config.interval).await;
        }

        Ok(self.stats)
    }

    pub fn state(&self) -> StationState {
        self.state
    }

    pub fn stats(&self) -> &StationStats {
        &self.stats
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn terminate(&mut self) {
        self.state = StationState::Terminated;
        error!("[{}] Simulated total failure, station going offline", self.config.station_id);
        debug!(
            "[{}] Final stats: {} cycles, {} published, {} publish failures, {} sensor faults",
            self.config.station_id,
            self.stats.cycles,
            self.stats.readings_published,
            self.stats.publish_failures,
            self.stats.sensor_faults
        );
    }

    // Never earlier than the previous reading, even if the wall clock steps back.
    fn capture_timestamp(&mut self) -> DateTime<Utc> {
        let now = self.clock.now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}
