mod common;

use common::{crash, sample_fleet};
use forensic_edr_rs::charts::*;
use forensic_edr_rs::models::{CrashType, ReportData, ReportType, Severity, TelemetryPoint};
use serde_json::json;

fn report(report_type: ReportType, data: serde_json::Value) -> ReportData {
    ReportData {
        report_id: "R-7".to_string(),
        report_type,
        generated_at: "2024-03-01T00:00:00Z".to_string(),
        data,
    }
}

#[test]
fn test_missing_or_mismatched_report_has_no_data() {
    assert_eq!(shape_chart_data(None, ReportType::Severity), ChartData::NoData);

    let timeline = report(ReportType::Timeline, json!([{ "date": "2024-03-01", "count": 2 }]));
    assert_eq!(shape_chart_data(Some(&timeline), ReportType::Severity), ChartData::NoData);
    assert!(shape_chart_data(Some(&timeline), ReportType::Severity).is_empty());
}

#[test]
fn test_empty_payload_has_no_data() {
    for report_type in ReportType::ALL {
        let empty = report(report_type, json!({}));
        assert_eq!(shape_chart_data(Some(&empty), report_type), ChartData::NoData, "{}", report_type);
    }
}

#[test]
fn test_severity_report_becomes_pie() {
    let data = report(ReportType::Severity, json!({ "minor": 4, "moderate": 2, "severe": 1 }));
    assert_eq!(
        shape_chart_data(Some(&data), ReportType::Severity),
        ChartData::Pie {
            labels: vec!["Minor".into(), "Moderate".into(), "Severe".into()],
            values: vec![4, 2, 1],
        }
    );
}

#[test]
fn test_timeline_report_becomes_line() {
    let data = report(
        ReportType::Timeline,
        json!({ "timeline": [
            { "date": "2024-03-01", "count": 4 },
            { "date": "2024-03-02", "count": 7 }
        ]}),
    );
    assert_eq!(
        shape_chart_data(Some(&data), ReportType::Timeline),
        ChartData::Line {
            x: vec!["2024-03-01".into(), "2024-03-02".into()],
            y: vec![4.0, 7.0],
        }
    );
}

#[test]
fn test_crash_type_and_geographic_reports_become_bars() {
    let types = report(ReportType::CrashTypes, json!({ "counts": { "rollover_event": 3 } }));
    assert_eq!(
        shape_chart_data(Some(&types), ReportType::CrashTypes),
        ChartData::Bar {
            labels: vec![
                "frontal impact collision".into(),
                "side impact collision".into(),
                "rear end collision".into(),
                "rollover event".into(),
            ],
            values: vec![0, 0, 0, 3],
        }
    );

    let geo = report(ReportType::Geographic, json!([{ "area": "Colombo", "count": 9 }]));
    assert_eq!(
        shape_chart_data(Some(&geo), ReportType::Geographic),
        ChartData::Bar { labels: vec!["Colombo".into()], values: vec![9] }
    );
}

#[test]
fn test_impact_report_becomes_scatter() {
    let data = report(
        ReportType::Impact,
        json!({ "samples": [{ "speed": 60, "impact_force_g": 4.5 }, { "speed": 95.5, "impact_force_g": 11 }] }),
    );
    assert_eq!(
        shape_chart_data(Some(&data), ReportType::Impact),
        ChartData::Scatter { x: vec![60.0, 95.5], y: vec![4.5, 11.0] }
    );
    assert_eq!(axis_titles(ReportType::Impact), ("Speed (km/h)", "Impact Force (G)"));
}

#[test]
fn test_chart_data_serializes_with_kind_tag() {
    let value = serde_json::to_value(ChartData::Bar { labels: vec!["a".into()], values: vec![1] }).unwrap();
    assert_eq!(value, json!({ "kind": "bar", "labels": ["a"], "values": [1] }));
    assert_eq!(serde_json::to_value(ChartData::NoData).unwrap(), json!({ "kind": "no_data" }));
}

#[test]
fn test_overview_of_empty_list_is_all_no_data() {
    let charts = overview_charts(&[]);
    assert!(charts.severity.is_empty());
    assert!(charts.timeline.is_empty());
    assert!(charts.crash_types.is_empty());
}

#[test]
fn test_overview_of_sample_fleet() {
    let charts = overview_charts(&sample_fleet());
    assert_eq!(
        charts.severity,
        ChartData::Pie {
            labels: vec!["Minor".into(), "Severe".into(), "Moderate".into()],
            values: vec![2, 2, 1],
        }
    );
    let ChartData::Line { x, y } = &charts.timeline else {
        panic!("expected a line chart, got {:?}", charts.timeline);
    };
    assert_eq!(x.len(), 5);
    assert_eq!(x.first().map(String::as_str), Some("2024-01-15T06:05:30+00:00"));
    assert_eq!(y.last(), Some(&12.4));

    let ChartData::Bar { values, .. } = &charts.crash_types else {
        panic!("expected a bar chart");
    };
    assert_eq!(values.iter().sum::<u64>(), 5);
}

#[test]
fn test_overview_timeline_without_parseable_timestamps() {
    let events = vec![crash("1", Severity::Minor, CrashType::RearEndCollision, "", "unknown")];
    let charts = overview_charts(&events);
    assert!(!charts.severity.is_empty());
    assert_eq!(charts.timeline, ChartData::NoData);
}

#[test]
fn test_telemetry_series_follow_sample_order() {
    let points = vec![
        TelemetryPoint {
            timestamp: "2024-03-01T08:14:59Z".into(),
            speed: 64.0,
            rpm: 3000.0,
            engine_load: 40.0,
            throttle_pos: 22.0,
            accel_x: 0.1,
            accel_y: -0.3,
            accel_z: 1.0,
            angular_acceleration: 0.5,
            ..Default::default()
        },
        TelemetryPoint {
            timestamp: "2024-03-01T08:15:00Z".into(),
            speed: 12.0,
            rpm: 900.0,
            engine_load: 15.0,
            accel_y: -8.9,
            ..Default::default()
        },
    ];

    let charts = telemetry_charts(&points);
    assert_eq!(charts.speed.name, "Speed");
    assert_eq!(charts.speed.y, vec![64.0, 12.0]);
    assert_eq!(charts.speed.x, vec!["2024-03-01T08:14:59Z".to_string(), "2024-03-01T08:15:00Z".to_string()]);
    assert_eq!(charts.acceleration.len(), 3);
    assert_eq!(charts.acceleration[1].name, "Accel Y (Longitudinal)");
    assert_eq!(charts.acceleration[1].y, vec![-0.3, -8.9]);
    assert_eq!(charts.throttle.y, vec![22.0, 0.0]);
    assert_eq!(
        charts.engine_load_vs_rpm,
        ChartData::Scatter { x: vec![3000.0, 900.0], y: vec![40.0, 15.0] }
    );
}

#[test]
fn test_telemetry_charts_for_crash_without_samples() {
    let charts = telemetry_charts(&[]);
    assert!(charts.speed.is_empty());
    assert!(charts.acceleration.iter().all(Series::is_empty));
    assert_eq!(charts.engine_load_vs_rpm, ChartData::NoData);
}

#[test]
fn test_unknown_report_type_has_no_data() {
    let data: ReportData = serde_json::from_value(json!({
        "report_id": "R-9",
        "report_type": "weekly_summary",
        "data": [{ "speed": 60, "impact_force_g": 4.5 }]
    }))
    .unwrap();
    assert_eq!(shape_chart_data(Some(&data), ReportType::Unknown), ChartData::NoData);
    assert_eq!(shape_chart_data(Some(&data), ReportType::Impact), ChartData::NoData);
}
