#![allow(dead_code)]

use std::collections::VecDeque;

use chrono::{DateTime, TimeZone, Utc};
use weather_station::fault_injection::{FaultModel, RandomSource, RngSource};

pub const NOMINAL_CYCLE: [f64; 4] = [0.5, 0.5, 0.5, 0.5];

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Replays a fixed list of draws and panics when it runs out.
pub struct ScriptedSource {
    draws: VecDeque<f64>,
}

impl ScriptedSource {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    /// `nominal` ordinary cycles followed by one terminal-failure cycle.
    pub fn nominal_then_terminal(nominal: usize) -> Self {
        let mut draws: Vec<f64> = std::iter::repeat(NOMINAL_CYCLE).take(nominal).flatten().collect();
        draws.extend([0.5, 0.5, 0.0]);
        Self::new(draws)
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().expect("scripted draws exhausted")
    }
}

/// What a seeded run does on each cycle, derived by replaying the same
/// draw sequence the station consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedCycle {
    Nominal,
    SensorFault,
    Terminal,
}

pub fn plan_seeded_run(seed: u64, max_cycles: usize) -> Vec<PlannedCycle> {
    let model = FaultModel::default();
    let mut source = RngSource::seeded(seed);
    let mut plan = Vec::new();

    for _ in 0..max_cycles {
        let faulted = source.next_unit() < model.sensor_fault_probability;
        if !faulted {
            source.next_unit();
        }
        if source.next_unit() < model.terminal_failure_probability {
            plan.push(PlannedCycle::Terminal);
            break;
        }
        source.next_unit();
        plan.push(if faulted {
            PlannedCycle::SensorFault
        } else {
            PlannedCycle::Nominal
        });
    }

    plan
}

/// First seed whose run hits `wanted` within `max_cycles`.
pub fn find_seed(wanted: PlannedCycle, max_cycles: usize) -> (u64, Vec<PlannedCycle>) {
    (0..100_000)
        .map(|seed| (seed, plan_seeded_run(seed, max_cycles)))
        .find(|(_, plan)| plan.contains(&wanted))
        .expect("no seed found in search range")
}
