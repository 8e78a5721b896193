//! Printable forensic incident report for a single crash.

use std::fmt;

use serde::Serialize;

use crate::format;
use crate::models::{CrashEvent, CustodyAction, CustodyActor, EvidenceCustodyLog};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustodyLine {
    pub timestamp: String,
    pub action: String,
    pub actor: String,
    pub location: String,
    pub entry_hash: String,
    pub verified: bool,
}

/// Display-ready fields of an incident report. Absent values read `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentReport {
    pub event_id: String,
    pub occurred_at: String,
    pub severity: String,
    pub crash_type: String,
    pub address: String,
    pub coordinates: String,
    pub speed_before: String,
    pub speed_at_impact: String,
    pub deceleration: String,
    pub impact_force: String,
    pub hard_brake: String,
    pub airbag_deployed: String,
    pub power_status: String,
    pub tilt: String,
    pub device_id: String,
    pub firmware_version: String,
    pub telemetry_samples: usize,
    pub custody: Vec<CustodyLine>,
}

fn or_na(s: &str) -> String {
    if s.trim().is_empty() {
        format::NOT_AVAILABLE.to_string()
    } else {
        s.to_string()
    }
}

fn action_label(action: CustodyAction) -> &'static str {
    match action {
        CustodyAction::EvidenceCollection => "Evidence collection",
        CustodyAction::Transfer => "Transfer",
        CustodyAction::Access => "Access",
        CustodyAction::Other => "Other",
    }
}

fn actor_label(actor: CustodyActor) -> &'static str {
    match actor {
        CustodyActor::EdgeDeviceV2 => "Edge device v2",
        CustodyActor::CloudApi => "Cloud API",
        CustodyActor::Other => "Other",
    }
}

impl IncidentReport {
    pub fn build(crash: &CrashEvent, custody: &[EvidenceCustodyLog]) -> Self {
        let values = &crash.calculated_values;
        Self {
            event_id: or_na(&crash.event_id),
            occurred_at: or_na(&format::date(&crash.timestamp)),
            severity: crash.severity.label().to_string(),
            crash_type: crash.crash_type.label(),
            address: or_na(&crash.location.address),
            coordinates: format::coordinates(crash.location.coordinates),
            speed_before: format::speed(values.speed_previous),
            speed_at_impact: format::speed(values.speed_now),
            deceleration: format::deceleration(values.deceleration),
            impact_force: format::g_force(values.impact_force_g),
            hard_brake: format::flag(values.hard_brake_event).to_string(),
            airbag_deployed: format::flag(values.airbag_status).to_string(),
            power_status: or_na(values.power_status.as_deref().unwrap_or_default()),
            tilt: format::or_na(values.tilt, |t| format!("{:.1}°", t)),
            device_id: or_na(&crash.metadata.device_id),
            firmware_version: or_na(&crash.metadata.firmware_version),
            telemetry_samples: crash.telemetry().len(),
            custody: custody
                .iter()
                .map(|entry| CustodyLine {
                    timestamp: format::date(&entry.timestamp),
                    action: action_label(entry.action).to_string(),
                    actor: actor_label(entry.actor).to_string(),
                    location: or_na(&entry.location),
                    entry_hash: or_na(&entry.entry_hash),
                    verified: entry.verified,
                })
                .collect(),
        }
    }
}

impl fmt::Display for IncidentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FORENSIC INCIDENT REPORT")?;
        writeln!(f, "Event ID:        {}", self.event_id)?;
        writeln!(f, "Occurred:        {}", self.occurred_at)?;
        writeln!(f, "Severity:        {}", self.severity)?;
        writeln!(f, "Crash type:      {}", self.crash_type)?;
        writeln!(f)?;
        writeln!(f, "LOCATION")?;
        writeln!(f, "Address:         {}", self.address)?;
        writeln!(f, "Coordinates:     {}", self.coordinates)?;
        writeln!(f)?;
        writeln!(f, "IMPACT ANALYSIS")?;
        writeln!(f, "Speed before:    {}", self.speed_before)?;
        writeln!(f, "Speed at impact: {}", self.speed_at_impact)?;
        writeln!(f, "Deceleration:    {}", self.deceleration)?;
        writeln!(f, "Impact force:    {}", self.impact_force)?;
        writeln!(f, "Hard brake:      {}", self.hard_brake)?;
        writeln!(f, "Airbag:          {}", self.airbag_deployed)?;
        writeln!(f, "Power:           {}", self.power_status)?;
        writeln!(f, "Tilt:            {}", self.tilt)?;
        writeln!(f)?;
        writeln!(f, "DEVICE")?;
        writeln!(f, "Device ID:       {}", self.device_id)?;
        writeln!(f, "Firmware:        {}", self.firmware_version)?;
        writeln!(f, "Telemetry:       {} samples", self.telemetry_samples)?;
        writeln!(f)?;
        writeln!(f, "CHAIN OF CUSTODY")?;
        if self.custody.is_empty() {
            writeln!(f, "No custody entries recorded.")?;
        }
        for line in &self.custody {
            writeln!(
                f,
                "{} | {} | {} | {} | {} | {}",
                line.timestamp,
                line.action,
                line.actor,
                line.location,
                line.entry_hash,
                if line.verified { "verified" } else { "unverified" }
            )?;
        }
        Ok(())
    }
}
