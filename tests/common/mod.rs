#![allow(dead_code)]

use forensic_edr_rs::models::{
    CalculatedValues, CrashEvent, CrashLocation, CrashMetadata, CrashType, Severity,
};

/// Builds a crash with the fields the derivations look at; everything else defaults.
pub fn crash(
    event_id: &str,
    severity: Severity,
    crash_type: CrashType,
    address: &str,
    timestamp: &str,
) -> CrashEvent {
    CrashEvent {
        event_id: event_id.to_string(),
        timestamp: timestamp.to_string(),
        crash_type,
        severity,
        location: CrashLocation::new(6.9271, 79.8612, address),
        calculated_values: CalculatedValues::default(),
        metadata: CrashMetadata {
            device_id: format!("DEV-{}", event_id),
            firmware_version: "2.1.0".to_string(),
        },
        raw_data: None,
    }
}

pub fn with_impact(mut event: CrashEvent, impact_force_g: f64, speed_previous: f64) -> CrashEvent {
    event.calculated_values.impact_force_g = impact_force_g;
    event.calculated_values.speed_previous = speed_previous;
    event
}

pub fn with_device(mut event: CrashEvent, device_id: &str) -> CrashEvent {
    event.metadata.device_id = device_id.to_string();
    event
}

/// A mixed fleet of crashes used across tests.
pub fn sample_fleet() -> Vec<CrashEvent> {
    vec![
        with_impact(
            crash("EVT-001", Severity::Minor, CrashType::RearEndCollision, "123 Colombo Rd, Colombo 03", "2024-03-01T08:15:00Z"),
            2.5,
            42.0,
        ),
        with_impact(
            crash("EVT-002", Severity::Severe, CrashType::FrontalImpactCollision, "45 Kandy St, Kandy", "2024-02-28T22:40:00Z"),
            9.8,
            88.5,
        ),
        with_impact(
            crash("EVT-003", Severity::Moderate, CrashType::SideImpactCollision, "Galle Face, Colombo", "2024-03-01T08:15:00Z"),
            5.1,
            61.0,
        ),
        with_impact(
            crash("evt-004", Severity::Severe, CrashType::RolloverEvent, "45 Kandy St, Kandy", "2024-03-02T11:00:00+05:30"),
            12.4,
            97.2,
        ),
        with_impact(
            crash("EVT-005", Severity::Minor, CrashType::RearEndCollision, "Negombo Rd, Wattala", "2024-01-15T06:05:30Z"),
            1.9,
            35.0,
        ),
    ]
}
