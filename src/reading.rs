use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::fault_injection::SENSOR_FAULT_SENTINEL;

/// Wire format for reading timestamps: UTC, second precision, literal `Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One simulated sensor sample as it goes out on the wire.
///
/// Serializes to a flat JSON object with exactly four keys:
/// `stationId`, `temperature`, `humidity` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub station_id: String,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(with = "utc_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Build a reading. Sub-second precision of `captured_at` is dropped.
    pub fn new(
        station_id: impl Into<String>,
        temperature: f64,
        humidity: f64,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            temperature,
            humidity,
            timestamp: captured_at.trunc_subsecs(0),
        }
    }

    /// True when the temperature carries the sensor malfunction sentinel.
    #[allow(clippy::float_cmp)]
    pub fn is_malfunction(&self) -> bool {
        self.temperature == SENSOR_FAULT_SENTINEL
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Serialize to the JSON payload published on the telemetry topic.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

mod utc_seconds {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_reading_serializes_to_four_camel_case_fields() {
        let reading = Reading::new("WS-07", 21.4, 45.5, sample_time());
        let value: serde_json::Value = serde_json::from_str(&reading.to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert_eq!(object["stationId"], "WS-07");
        assert_eq!(object["temperature"], 21.4);
        assert_eq!(object["humidity"], 45.5);
        assert_eq!(object["timestamp"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_subsecond_precision_is_dropped() {
        let captured = sample_time() + chrono::Duration::milliseconds(1750);
        let reading = Reading::new("WS-01", 20.0, 40.0, captured);

        assert_eq!(reading.timestamp.nanosecond(), 0);
        assert_eq!(reading.formatted_timestamp(), "2024-01-01T00:00:01Z");
    }

    #[test]
    fn test_payload_parses_back() {
        let reading = Reading::new("WS-03", -999.0, 33.3, sample_time());
        let parsed: Reading = serde_json::from_str(&reading.to_json().unwrap()).unwrap();

        assert_eq!(parsed, reading);
        assert!(parsed.is_malfunction());
    }

    #[test]
    fn test_rejects_timestamp_without_zulu_suffix() {
        let payload = r#"{"stationId":"WS-01","temperature":20.0,"humidity":40.0,"timestamp":"2024-01-01T00:00:00"}"#;
        assert!(serde_json::from_str::<Reading>(payload).is_err());
    }
}
