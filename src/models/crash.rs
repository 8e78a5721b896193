use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::{
    deserialize_coordinates, deserialize_flag, deserialize_lenient_f64, deserialize_optional_f64,
    null_to_default,
};
use super::telemetry::TelemetryPoint;

// ===== ENUMS =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Minor, Severity::Moderate, Severity::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Unknown => "unknown",
        }
    }

    /// Capitalised label used for chart legends ("Minor", "Severe", ...).
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
            Severity::Unknown => "Unknown",
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s {
            "minor" => Severity::Minor,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            _ => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashType {
    FrontalImpactCollision,
    SideImpactCollision,
    RearEndCollision,
    RolloverEvent,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CrashType {
    pub const ALL: [CrashType; 4] = [
        CrashType::FrontalImpactCollision,
        CrashType::SideImpactCollision,
        CrashType::RearEndCollision,
        CrashType::RolloverEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrashType::FrontalImpactCollision => "frontal_impact_collision",
            CrashType::SideImpactCollision => "side_impact_collision",
            CrashType::RearEndCollision => "rear_end_collision",
            CrashType::RolloverEvent => "rollover_event",
            CrashType::Unknown => "unknown",
        }
    }

    /// Human label with underscores replaced by spaces ("rear end collision").
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl From<&str> for CrashType {
    fn from(s: &str) -> Self {
        match s {
            "frontal_impact_collision" => CrashType::FrontalImpactCollision,
            "side_impact_collision" => CrashType::SideImpactCollision,
            "rear_end_collision" => CrashType::RearEndCollision,
            "rollover_event" => CrashType::RolloverEvent,
            _ => CrashType::Unknown,
        }
    }
}

impl fmt::Display for CrashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== DATA STRUCTURES =====

/// GeoJSON point plus a free-text address. Coordinates are stored `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashLocation {
    #[serde(rename = "type", deserialize_with = "null_to_default")]
    pub kind: String,
    #[serde(deserialize_with = "deserialize_coordinates")]
    pub coordinates: [f64; 2],
    #[serde(deserialize_with = "null_to_default")]
    pub address: String,
}

impl Default for CrashLocation {
    fn default() -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [0.0, 0.0],
            address: String::new(),
        }
    }
}

impl CrashLocation {
    pub fn new(latitude: f64, longitude: f64, address: impl Into<String>) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [longitude, latitude],
            address: address.into(),
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// First comma-delimited token of the address, trimmed. Used as the hotspot key.
    pub fn area(&self) -> &str {
        self.address.split(',').next().unwrap_or_default().trim()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatedValues {
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub speed_now: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub speed_previous: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub deceleration: f64,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub impact_force_g: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub hard_brake_event: Option<bool>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub airbag_status: Option<bool>,
    pub power_status: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_f64")]
    pub tilt: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashMetadata {
    #[serde(deserialize_with = "null_to_default")]
    pub device_id: String,
    #[serde(deserialize_with = "null_to_default")]
    pub firmware_version: String,
}

/// One recorded collision as returned by `/crashes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashEvent {
    #[serde(deserialize_with = "null_to_default")]
    pub event_id: String,
    #[serde(deserialize_with = "null_to_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_to_default")]
    pub crash_type: CrashType,
    #[serde(deserialize_with = "null_to_default")]
    pub severity: Severity,
    #[serde(deserialize_with = "null_to_default")]
    pub location: CrashLocation,
    #[serde(deserialize_with = "null_to_default")]
    pub calculated_values: CalculatedValues,
    #[serde(deserialize_with = "null_to_default")]
    pub metadata: CrashMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Vec<TelemetryPoint>>,
}

impl CrashEvent {
    /// Parses `timestamp` as an RFC 3339 instant. Naive timestamps are read as UTC.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        crate::format::parse_timestamp(&self.timestamp)
    }

    pub fn telemetry(&self) -> &[TelemetryPoint] {
        self.raw_data.as_deref().unwrap_or_default()
    }

    pub fn has_telemetry(&self) -> bool {
        !self.telemetry().is_empty()
    }
}

/// Envelope some deployments wrap `/crashes/{id}` responses in.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CrashEnvelope {
    Wrapped { crash_event: CrashEvent },
    Bare(CrashEvent),
}

impl CrashEnvelope {
    pub(crate) fn into_inner(self) -> CrashEvent {
        match self {
            CrashEnvelope::Wrapped { crash_event } => crash_event,
            CrashEnvelope::Bare(event) => event,
        }
    }
}

/// Server-side filters for `GET /crashes`, serialized as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrashFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(rename = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub crash_type: Option<CrashType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CrashFilters {
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_crash_type(mut self, crash_type: CrashType) -> Self {
        self.crash_type = Some(crash_type);
        self
    }

    pub fn with_date_range(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
