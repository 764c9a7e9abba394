//! Plausibility checks for readings.
//!
//! These are advisory. The station publishes malfunction readings on purpose
//! so that consumers can exercise their own anomaly handling; nothing here
//! gates publication.

use core::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::reading::Reading;

pub const ABSOLUTE_ZERO_C: f64 = -273.0;
pub const HUMIDITY_MIN_PERCENT: f64 = 0.0;
pub const HUMIDITY_MAX_PERCENT: f64 = 100.0;

/// A temperature is plausible when it is not below absolute zero.
/// The `-999` malfunction sentinel fails this check.
pub fn validate_temperature(temperature: f64) -> bool {
    temperature >= ABSOLUTE_ZERO_C
}

/// Relative humidity must lie within 0..=100 percent.
pub fn validate_humidity(humidity: f64) -> bool {
    (HUMIDITY_MIN_PERCENT..=HUMIDITY_MAX_PERCENT).contains(&humidity)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValidationIssue {
    InvalidTemperature(String),
    InvalidHumidity(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::InvalidTemperature(value) => write!(f, "Invalid temperature: {}", value),
            ValidationIssue::InvalidHumidity(value) => write!(f, "Invalid humidity: {}", value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn validate_reading(reading: &Reading) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !validate_temperature(reading.temperature) {
        report
            .issues
            .push(ValidationIssue::InvalidTemperature(reading.temperature.to_string()));
    }
    if !validate_humidity(reading.humidity) {
        report
            .issues
            .push(ValidationIssue::InvalidHumidity(reading.humidity.to_string()));
    }

    report
}

/// Check a raw JSON payload as a downstream consumer would see it.
///
/// A field that is missing or not a JSON number is reported as invalid.
/// Only malformed JSON is an error.
pub fn validate_payload(payload: &str) -> Result<ValidationReport, serde_json::Error> {
    let value: Value = serde_json::from_str(payload)?;
    let mut report = ValidationReport::default();

    let temperature = value.get("temperature");
    if !temperature.and_then(Value::as_f64).is_some_and(validate_temperature) {
        report
            .issues
            .push(ValidationIssue::InvalidTemperature(describe(temperature)));
    }

    let humidity = value.get("humidity");
    if !humidity.and_then(Value::as_f64).is_some_and(validate_humidity) {
        report
            .issues
            .push(ValidationIssue::InvalidHumidity(describe(humidity)));
    }

    Ok(report)
}

fn describe(field: Option<&Value>) -> String {
    field.map_or_else(|| "missing".to_string(), Value::to_string)
}
