//! Chart-series shaping for reports, the overview page and telemetry detail.
//!
//! Output is renderer-agnostic: plain label/value vectors that any plotting
//! front end (or the CLI's JSON output) can consume.

use serde::Serialize;

use crate::analytics::{build_timeline, crash_type_distribution, severity_distribution};
use crate::models::{CrashEvent, ReportData, ReportPayload, ReportType, TelemetryPoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    /// Nothing to plot: the report is not loaded, belongs to another type, or is empty.
    NoData,
    Pie {
        labels: Vec<String>,
        values: Vec<u64>,
    },
    Line {
        x: Vec<String>,
        y: Vec<f64>,
    },
    Bar {
        labels: Vec<String>,
        values: Vec<u64>,
    },
    Scatter {
        x: Vec<f64>,
        y: Vec<f64>,
    },
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChartData::NoData)
    }
}

/// `(x, y)` axis titles for a report chart.
pub fn axis_titles(report_type: ReportType) -> (&'static str, &'static str) {
    match report_type {
        ReportType::Impact => ("Speed (km/h)", "Impact Force (G)"),
        ReportType::Geographic => ("Area", "Count"),
        ReportType::CrashTypes => ("Crash Type", "Count"),
        ReportType::Severity | ReportType::Timeline => ("Date", "Count"),
        ReportType::Unknown => ("", ""),
    }
}

/// Maps a report payload to the series its chart needs.
///
/// `report` is `None` while the report is loading or failed to load.
pub fn shape_chart_data(report: Option<&ReportData>, report_type: ReportType) -> ChartData {
    let Some(report) = report else {
        return ChartData::NoData;
    };
    if report.report_type != report_type {
        return ChartData::NoData;
    }

    let payload = report.payload();
    if payload.is_empty() {
        return ChartData::NoData;
    }

    match payload {
        ReportPayload::Severity(buckets) => {
            let (labels, values) = buckets
                .into_iter()
                .map(|(severity, n)| (severity.label().to_string(), n))
                .unzip();
            ChartData::Pie { labels, values }
        }
        ReportPayload::Timeline(buckets) => {
            let (x, y) = buckets.into_iter().map(|b| (b.date, b.count as f64)).unzip();
            ChartData::Line { x, y }
        }
        ReportPayload::CrashTypes(buckets) => {
            let (labels, values) = buckets
                .into_iter()
                .map(|(crash_type, n)| (crash_type.label(), n))
                .unzip();
            ChartData::Bar { labels, values }
        }
        ReportPayload::Geographic(hotspots) => {
            let (labels, values) = hotspots.into_iter().map(|h| (h.area, h.count)).unzip();
            ChartData::Bar { labels, values }
        }
        ReportPayload::Impact(samples) => {
            let (x, y) = samples
                .into_iter()
                .map(|s| (s.speed, s.impact_force_g))
                .unzip();
            ChartData::Scatter { x, y }
        }
        ReportPayload::Unsupported => ChartData::NoData,
    }
}

// ===== OVERVIEW =====

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewCharts {
    pub severity: ChartData,
    pub timeline: ChartData,
    pub crash_types: ChartData,
}

/// Severity pie, impact-force timeline and crash-type bars for a crash list.
pub fn overview_charts(events: &[CrashEvent]) -> OverviewCharts {
    if events.is_empty() {
        return OverviewCharts {
            severity: ChartData::NoData,
            timeline: ChartData::NoData,
            crash_types: ChartData::NoData,
        };
    }

    let (labels, values) = severity_distribution(events)
        .iter()
        .map(|(severity, n)| (severity.label().to_string(), n as u64))
        .unzip();
    let severity = ChartData::Pie { labels, values };

    let timeline = build_timeline(events);
    let timeline = if timeline.is_empty() {
        ChartData::NoData
    } else {
        let (x, y) = timeline
            .into_iter()
            .map(|p| (p.timestamp.to_rfc3339(), p.impact_force_g))
            .unzip();
        ChartData::Line { x, y }
    };

    let (labels, values) = crash_type_distribution(events)
        .iter()
        .map(|(crash_type, n)| (crash_type.label(), n as u64))
        .unzip();
    let crash_types = ChartData::Bar { labels, values };

    OverviewCharts {
        severity,
        timeline,
        crash_types,
    }
}

// ===== TELEMETRY =====

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

impl Series {
    fn over_time(name: &str, points: &[TelemetryPoint], value: fn(&TelemetryPoint) -> f64) -> Self {
        Self {
            name: name.to_string(),
            x: points.iter().map(|p| p.timestamp.clone()).collect(),
            y: points.iter().map(value).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Series for the crash detail view, in sample order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryCharts {
    pub speed: Series,
    pub angular_acceleration: Series,
    /// Lateral, longitudinal and vertical acceleration, in that order.
    pub acceleration: Vec<Series>,
    pub throttle: Series,
    /// Engine load (y) against rpm (x).
    pub engine_load_vs_rpm: ChartData,
}

pub fn telemetry_charts(points: &[TelemetryPoint]) -> TelemetryCharts {
    let engine_load_vs_rpm = if points.is_empty() {
        ChartData::NoData
    } else {
        ChartData::Scatter {
            x: points.iter().map(|p| p.rpm).collect(),
            y: points.iter().map(|p| p.engine_load).collect(),
        }
    };

    TelemetryCharts {
        speed: Series::over_time("Speed", points, |p| p.speed),
        angular_acceleration: Series::over_time("Angular Accel", points, |p| p.angular_acceleration),
        acceleration: vec![
            Series::over_time("Accel X (Lateral)", points, |p| p.accel_x),
            Series::over_time("Accel Y (Longitudinal)", points, |p| p.accel_y),
            Series::over_time("Accel Z (Vertical)", points, |p| p.accel_z),
        ],
        throttle: Series::over_time("Throttle", points, |p| p.throttle_pos),
        engine_load_vs_rpm,
    }
}
