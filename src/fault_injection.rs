use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Temperature value published when the simulated sensor malfunctions.
pub const SENSOR_FAULT_SENTINEL: f64 = -999.0;

// Per-cycle fault rates
const SENSOR_FAULT_PROBABILITY: f64 = 0.01;       // 1% - bad temperature sample
const TERMINAL_FAILURE_PROBABILITY: f64 = 0.005;  // 0.5% - device dies for good

// Normal operating ranges, inclusive
const TEMPERATURE_MIN_C: f64 = 15.0;
const TEMPERATURE_MAX_C: f64 = 30.0;
const HUMIDITY_MIN_PERCENT: f64 = 30.0;
const HUMIDITY_MAX_PERCENT: f64 = 60.0;

/// Source of uniform draws in `[0, 1)`.
///
/// Every probabilistic decision the station makes goes through this trait,
/// so a seeded or scripted source makes a whole run reproducible.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// [`RandomSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Deterministic source; the same seed replays the same run.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Configuration for fault injection and sample ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultModel {
    pub sensor_fault_probability: f64,
    pub terminal_failure_probability: f64,
    pub temperature_range_c: (f64, f64),
    pub humidity_range_percent: (f64, f64),
}

impl Default for FaultModel {
    fn default() -> Self {
        Self {
            sensor_fault_probability: SENSOR_FAULT_PROBABILITY,
            terminal_failure_probability: TERMINAL_FAILURE_PROBABILITY,
            temperature_range_c: (TEMPERATURE_MIN_C, TEMPERATURE_MAX_C),
            humidity_range_percent: (HUMIDITY_MIN_PERCENT, HUMIDITY_MAX_PERCENT),
        }
    }
}

impl FaultModel {
    /// A model that never faults and never fails.
    pub fn fault_free() -> Self {
        Self {
            sensor_fault_probability: 0.0,
            terminal_failure_probability: 0.0,
            ..Self::default()
        }
    }
}

/// Sensor values drawn for a cycle that survived the terminal-failure check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub temperature: f64,
    pub humidity: f64,
    pub malfunction: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleDraw {
    Sample(SensorSample),
    TerminalFailure,
}

/// Probabilistic fault injection engine
#[derive(Debug)]
pub struct FaultInjector<R> {
    model: FaultModel,
    rng: R,
}

impl<R: RandomSource> FaultInjector<R> {
    pub fn new(rng: R) -> Self {
        Self::new_with_model(FaultModel::default(), rng)
    }

    pub fn new_with_model(model: FaultModel, rng: R) -> Self {
        Self { model, rng }
    }

    /// Draw everything one cycle needs, in a fixed order: sensor fault,
    /// temperature (skipped when faulted), terminal failure, humidity.
    pub fn draw_cycle(&mut self) -> CycleDraw {
        let malfunction = self.chance(self.model.sensor_fault_probability);
        let temperature = if malfunction {
            SENSOR_FAULT_SENTINEL
        } else {
            self.uniform_tenths(self.model.temperature_range_c)
        };

        if self.chance(self.model.terminal_failure_probability) {
            return CycleDraw::TerminalFailure;
        }

        let humidity = self.uniform_tenths(self.model.humidity_range_percent);

        CycleDraw::Sample(SensorSample {
            temperature,
            humidity,
            malfunction,
        })
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.next_unit() < probability.clamp(0.0, 1.0)
    }

    fn uniform_tenths(&mut self, (low, high): (f64, f64)) -> f64 {
        let value = low + (high - low) * self.rng.next_unit();
        round_tenths(value).clamp(low, high)
    }
}

/// Round to one decimal place.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<f64>);

    impl RandomSource for Scripted {
        fn next_unit(&mut self) -> f64 {
            self.0.pop_front().expect("script exhausted")
        }
    }

    fn scripted(values: &[f64]) -> FaultInjector<Scripted> {
        FaultInjector::new(Scripted(values.iter().copied().collect()))
    }

    fn is_tenths(value: f64) -> bool {
        ((value * 10.0).round() - value * 10.0).abs() < 1e-9
    }

    #[test]
    fn test_default_model() {
        let model = FaultModel::default();
        assert_eq!(model.sensor_fault_probability, 0.01);
        assert_eq!(model.terminal_failure_probability, 0.005);
        assert_eq!(model.temperature_range_c, (15.0, 30.0));
        assert_eq!(model.humidity_range_percent, (30.0, 60.0));
    }

    #[test]
    fn test_nominal_cycle_consumes_four_draws() {
        let mut injector = scripted(&[0.5, 0.0, 0.5, 0.999_999]);

        match injector.draw_cycle() {
            CycleDraw::Sample(sample) => {
                assert!(!sample.malfunction);
                assert_eq!(sample.temperature, 15.0);
                assert_eq!(sample.humidity, 60.0);
            }
            CycleDraw::TerminalFailure => panic!("unexpected terminal failure"),
        }
        assert!(injector.rng.0.is_empty());
    }

    #[test]
    fn test_sensor_fault_skips_temperature_draw() {
        let mut injector = scripted(&[0.001, 0.5, 0.5]);

        match injector.draw_cycle() {
            CycleDraw::Sample(sample) => {
                assert!(sample.malfunction);
                assert_eq!(sample.temperature, SENSOR_FAULT_SENTINEL);
                assert_eq!(sample.humidity, 45.0);
            }
            CycleDraw::TerminalFailure => panic!("unexpected terminal failure"),
        }
    }

    #[test]
    fn test_terminal_failure_stops_before_humidity() {
        let mut injector = scripted(&[0.5, 0.5, 0.004]);

        assert_eq!(injector.draw_cycle(), CycleDraw::TerminalFailure);
        assert!(injector.rng.0.is_empty());
    }

    #[test]
    fn test_terminal_failure_checked_even_when_faulted() {
        let mut injector = scripted(&[0.0, 0.0]);
        assert_eq!(injector.draw_cycle(), CycleDraw::TerminalFailure);
    }

    #[test]
    fn test_seeded_samples_stay_in_range() {
        let mut injector = FaultInjector::new_with_model(FaultModel::fault_free(), RngSource::seeded(42));

        for _ in 0..10_000 {
            let CycleDraw::Sample(sample) = injector.draw_cycle() else {
                panic!("fault-free model failed");
            };
            assert!((15.0..=30.0).contains(&sample.temperature));
            assert!((30.0..=60.0).contains(&sample.humidity));
            assert!(is_tenths(sample.temperature));
            assert!(is_tenths(sample.humidity));
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut first = FaultInjector::new(RngSource::seeded(7));
        let mut second = FaultInjector::new(RngSource::seeded(7));

        for _ in 0..100 {
            assert_eq!(first.draw_cycle(), second.draw_cycle());
        }
    }

    #[test]
    fn test_out_of_range_probabilities_are_clamped() {
        let model = FaultModel {
            sensor_fault_probability: 5.0,
            terminal_failure_probability: -1.0,
            ..FaultModel::default()
        };
        let mut injector = FaultInjector::new_with_model(model, Scripted(vec![0.999, 0.0, 0.5].into()));

        match injector.draw_cycle() {
            CycleDraw::Sample(sample) => assert!(sample.malfunction),
            CycleDraw::TerminalFailure => panic!("negative probability must never fire"),
        }
    }

    #[test]
    fn test_round_tenths() {
        assert_eq!(round_tenths(21.449), 21.4);
        assert_eq!(round_tenths(21.45000001), 21.5);
        assert_eq!(round_tenths(29.96), 30.0);
    }
}
