use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::crash::{CrashType, Severity};
use super::serde_helpers::{deserialize_lenient_f64, null_to_default};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[default]
    Severity,
    Timeline,
    Geographic,
    CrashTypes,
    Impact,
    /// A report type this client does not know; its payload is never decoded.
    #[serde(other)]
    Unknown,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Severity,
        ReportType::Timeline,
        ReportType::Geographic,
        ReportType::CrashTypes,
        ReportType::Impact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Severity => "severity",
            ReportType::Timeline => "timeline",
            ReportType::Geographic => "geographic",
            ReportType::CrashTypes => "crash_types",
            ReportType::Impact => "impact",
            ReportType::Unknown => "unknown",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportType::Severity => "Severity Distribution",
            ReportType::Timeline => "Timeline Analysis",
            ReportType::Geographic => "Geographic Hotspots",
            ReportType::CrashTypes => "Crash Types",
            ReportType::Impact => "Impact Analysis",
            ReportType::Unknown => "Unknown Report",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown report type: {}", s))
    }
}

/// A generated aggregate report. `data` stays opaque until [`ReportData::payload`] decodes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportData {
    #[serde(deserialize_with = "null_to_default")]
    pub report_id: String,
    #[serde(deserialize_with = "null_to_default")]
    pub report_type: ReportType,
    #[serde(deserialize_with = "null_to_default")]
    pub generated_at: String,
    pub data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineBucket {
    #[serde(alias = "timestamp", alias = "period", deserialize_with = "null_to_default")]
    pub date: String,
    #[serde(deserialize_with = "null_to_default")]
    pub count: u64,
    #[serde(alias = "impact_force_g", deserialize_with = "deserialize_lenient_f64")]
    pub avg_impact_force_g: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotBucket {
    #[serde(alias = "location", alias = "address", alias = "city", deserialize_with = "null_to_default")]
    pub area: String,
    #[serde(deserialize_with = "null_to_default")]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactSample {
    #[serde(alias = "speed_previous", deserialize_with = "deserialize_lenient_f64")]
    pub speed: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub impact_force_g: f64,
}

/// Typed view of a report payload, one shape per [`ReportType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportPayload {
    Severity(Vec<(Severity, u64)>),
    Timeline(Vec<TimelineBucket>),
    Geographic(Vec<HotspotBucket>),
    CrashTypes(Vec<(CrashType, u64)>),
    Impact(Vec<ImpactSample>),
    Unsupported,
}

impl ReportPayload {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportPayload::Severity(_) => ReportType::Severity,
            ReportPayload::Timeline(_) => ReportType::Timeline,
            ReportPayload::Geographic(_) => ReportType::Geographic,
            ReportPayload::CrashTypes(_) => ReportType::CrashTypes,
            ReportPayload::Impact(_) => ReportType::Impact,
            ReportPayload::Unsupported => ReportType::Unknown,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ReportPayload::Severity(b) => b.iter().all(|(_, n)| *n == 0),
            ReportPayload::Timeline(p) => p.is_empty(),
            ReportPayload::Geographic(h) => h.is_empty(),
            ReportPayload::CrashTypes(b) => b.iter().all(|(_, n)| *n == 0),
            ReportPayload::Impact(s) => s.is_empty(),
            ReportPayload::Unsupported => true,
        }
    }
}

impl ReportData {
    /// Decodes `data` according to `report_type`.
    ///
    /// Counts may arrive at the top level or nested under `distribution` /
    /// `counts`; series may be a bare array or nested under `points`,
    /// `hotspots` or `samples`. Entries that do not decode are skipped.
    pub fn payload(&self) -> ReportPayload {
        match self.report_type {
            ReportType::Severity => {
                let counts = nested(&self.data, &["distribution", "counts"]);
                ReportPayload::Severity(
                    Severity::ALL
                        .into_iter()
                        .map(|s| (s, count_at(counts, s.as_str())))
                        .collect(),
                )
            }
            ReportType::CrashTypes => {
                let counts = nested(&self.data, &["distribution", "counts"]);
                ReportPayload::CrashTypes(
                    CrashType::ALL
                        .into_iter()
                        .map(|t| (t, count_at(counts, t.as_str())))
                        .collect(),
                )
            }
            ReportType::Timeline => {
                ReportPayload::Timeline(decode_series(nested(&self.data, &["points", "timeline"])))
            }
            ReportType::Geographic => {
                let hotspots = nested(&self.data, &["hotspots", "locations"]);
                let buckets = match hotspots {
                    Value::Object(map) => map
                        .iter()
                        .map(|(area, n)| HotspotBucket {
                            area: area.clone(),
                            count: value_as_count(n),
                        })
                        .collect(),
                    other => decode_series(other),
                };
                ReportPayload::Geographic(buckets)
            }
            ReportType::Impact => {
                ReportPayload::Impact(decode_series(nested(&self.data, &["samples", "points"])))
            }
            ReportType::Unknown => ReportPayload::Unsupported,
        }
    }
}

fn nested<'a>(data: &'a Value, keys: &[&str]) -> &'a Value {
    keys.iter().find_map(|k| data.get(*k)).unwrap_or(data)
}

fn count_at(counts: &Value, key: &str) -> u64 {
    counts.get(key).map(value_as_count).unwrap_or(0)
}

fn value_as_count(v: &Value) -> u64 {
    v.as_u64()
        .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        .unwrap_or(0)
}

fn decode_series<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
