use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::{deserialize_flag, deserialize_lenient_f64, null_to_default};

/// One high-frequency sensor sample from the window around a crash.
///
/// Samples have no identity of their own; their position in the parent
/// `raw_data` sequence is chronological and is preserved as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryPoint {
    #[serde(deserialize_with = "null_to_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub speed: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub rpm: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub throttle_pos: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub engine_load: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub coolant_temp: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub fuel_level: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub longitude: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub accel_x: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub accel_y: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub accel_z: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub total_acceleration: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub angular_acceleration: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub tilt: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub airbag_status: Option<bool>,
    pub power_status: Option<String>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub hard_brake_event: Option<bool>,
}

impl TelemetryPoint {
    pub fn sampled_at(&self) -> Option<DateTime<Utc>> {
        crate::format::parse_timestamp(&self.timestamp)
    }
}
