use anyhow::{anyhow, bail, Result};
use clap::Parser;
use forensic_edr_rs::analytics::{
    build_timeline, compute_kpis, filter, hotspots, verified_share, CrashTypeFilter,
    FilterCriteria, SeverityFilter,
};
use forensic_edr_rs::charts::{overview_charts, shape_chart_data, telemetry_charts};
use forensic_edr_rs::client::DEFAULT_CUSTODY_SAMPLE;
use forensic_edr_rs::format;
use forensic_edr_rs::incident::IncidentReport;
use forensic_edr_rs::models::{CrashEvent, CrashFilters, ReportType};
use forensic_edr_rs::query::{CrashQueries, QueryState};
use forensic_edr_rs::{ApiConfig, ForensicClient};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, rename_all = "snake_case")]
struct Args {
    /// Command to execute: list_crashes, get_crash, nearby, custody, custody_all, kpis, hotspots, timeline, overview, telemetry, report, recent_reports, incident, browse
    #[arg(short, long)]
    command: String,

    /// API base URL (or set FORENSIC_EDR_API_URL env var)
    #[arg(long, name = "api_url")]
    api_url: Option<String>,

    /// Severity filter: all, minor, moderate, severe
    #[arg(long, name = "severity", default_value = "all")]
    severity: String,

    /// Crash type filter: all, frontal_impact_collision, side_impact_collision, rear_end_collision, rollover_event
    #[arg(long, name = "crash_type", default_value = "all")]
    crash_type: String,

    /// Case-insensitive search over event id and address
    #[arg(long, name = "search", default_value = "")]
    search: String,

    /// Event ID (for get_crash, custody, telemetry and incident commands)
    #[arg(long, name = "event_id")]
    event_id: Option<String>,

    /// Latitude (for nearby command)
    #[arg(long, name = "lat")]
    lat: Option<f64>,

    /// Longitude (for nearby command)
    #[arg(long, name = "lon")]
    lon: Option<f64>,

    /// Search radius in km (for nearby command)
    #[arg(long, name = "radius_km", default_value = "5")]
    radius_km: f64,

    /// Report type: severity, timeline, geographic, crash_types, impact
    #[arg(long, name = "report_type", default_value = "severity")]
    report_type: String,

    /// Server-side start date filter (ISO-8601)
    #[arg(long, name = "start_date")]
    start_date: Option<String>,

    /// Server-side end date filter (ISO-8601)
    #[arg(long, name = "end_date")]
    end_date: Option<String>,

    /// Maximum crashes to request
    #[arg(long, name = "limit")]
    limit: Option<u32>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

// example usage:
// FORENSIC_EDR_API_URL=http://localhost:8000/api/v1 ./target/release/edr_cli --command list_crashes --severity severe --search colombo
// ./target/release/edr_cli --command kpis
// ./target/release/edr_cli --command hotspots --crash_type rear_end_collision
// ./target/release/edr_cli --command get_crash --event_id EVT-2024-0001
// ./target/release/edr_cli --command nearby --lat 6.9271 --lon 79.8612 --radius_km 2
// ./target/release/edr_cli --command custody --event_id EVT-2024-0001
// ./target/release/edr_cli --command report --report_type crash_types
// ./target/release/edr_cli --command incident --event_id EVT-2024-0001
// ./target/release/edr_cli --command browse

#[derive(Serialize)]
struct KpiSummary {
    #[serde(flatten)]
    kpis: forensic_edr_rs::analytics::Kpis,
    verified_evidence: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Unwraps a settled query, logging and exiting on error.
fn settled<V>(state: QueryState<V>, what: &str) -> Result<Arc<V>> {
    match state {
        QueryState::Data(data) => Ok(data),
        QueryState::Error(e) => {
            error!("Failed to load {}: {}", what, e);
            if e.is_retryable() {
                error!("The request can be retried.");
            }
            std::process::exit(1);
        }
        QueryState::Idle | QueryState::Loading => Err(anyhow!("{} query did not settle", what)),
    }
}

fn require_event_id(args: &Args) -> Result<&str> {
    match args.event_id.as_deref() {
        Some(id) if !id.is_empty() => Ok(id),
        _ => bail!("event_id required for {}", args.command),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!("forensic_edr_rs={},edr_cli={}", args.log_level, args.log_level))
        .init();

    let config = ApiConfig::from_env_with_url(args.api_url.clone())?;
    info!("Using API at {}", config.base_url());
    let queries = CrashQueries::new(ForensicClient::new(config)?);

    let criteria = FilterCriteria::default()
        .with_severity(args.severity.parse::<SeverityFilter>().map_err(|e| anyhow!(e))?)
        .with_crash_type(args.crash_type.parse::<CrashTypeFilter>().map_err(|e| anyhow!(e))?)
        .with_search(args.search.clone());

    let mut server_filters = CrashFilters::default().with_date_range(args.start_date.clone(), args.end_date.clone());
    if let Some(limit) = args.limit {
        server_filters = server_filters.with_limit(limit);
    }

    match args.command.as_str() {
        "list_crashes" => {
            let crashes = settled(queries.crashes(&server_filters).await, "crashes")?;
            print_json(&filter(&crashes, &criteria))?;
        }
        "get_crash" => {
            let event_id = require_event_id(&args)?;
            let crash = settled(queries.crash(event_id).await, "crash")?;
            print_json(&*crash)?;
        }
        "nearby" => {
            let (Some(lat), Some(lon)) = (args.lat, args.lon) else {
                bail!("lat and lon required for nearby");
            };
            let crashes = queries.client().get_nearby(lat, lon, args.radius_km).await?;
            print_json(&filter(&crashes, &criteria))?;
        }
        "custody" => {
            let event_id = require_event_id(&args)?;
            let chain = settled(queries.custody_chain(event_id).await, "custody chain")?;
            print_json(&*chain)?;
        }
        "custody_all" => {
            let logs = settled(queries.all_custody_logs().await, "custody logs")?;
            info!("Collected custody entries for up to {} crashes", DEFAULT_CUSTODY_SAMPLE);
            print_json(&*logs)?;
        }
        "kpis" => {
            let crashes = settled(queries.crashes(&server_filters).await, "crashes")?;
            let filtered = filter(&crashes, &criteria);
            let verified = match queries.all_custody_logs().await {
                QueryState::Data(logs) => verified_share(&logs),
                _ => None,
            };
            print_json(&KpiSummary {
                kpis: compute_kpis(&filtered),
                verified_evidence: format::or_na(verified, format::percentage),
            })?;
        }
        "hotspots" => {
            let crashes = settled(queries.crashes(&server_filters).await, "crashes")?;
            let ranked = hotspots(&filter(&crashes, &criteria)).ranked();
            for (area, count) in ranked {
                println!("{:>5}  {}", count, if area.is_empty() { format::NOT_AVAILABLE } else { area.as_str() });
            }
        }
        "timeline" => {
            let crashes = settled(queries.crashes(&server_filters).await, "crashes")?;
            print_json(&build_timeline(&filter(&crashes, &criteria)))?;
        }
        "overview" => {
            let crashes = settled(queries.crashes(&server_filters).await, "crashes")?;
            print_json(&overview_charts(&filter(&crashes, &criteria)))?;
        }
        "telemetry" => {
            let event_id = require_event_id(&args)?;
            let crash = settled(queries.crash(event_id).await, "crash")?;
            print_json(&telemetry_charts(crash.telemetry()))?;
        }
        "report" => {
            let report_type: ReportType = args.report_type.parse().map_err(|e: String| anyhow!(e))?;
            let state = queries.report(report_type).await;
            let chart = shape_chart_data(state.data().map(Arc::as_ref), report_type);
            let report = settled(state, "report")?;
            println!("{} ({}), generated {}", report_type.title(), report.report_id, format::date(&report.generated_at));
            print_json(&chart)?;
        }
        "recent_reports" => {
            let reports = queries.client().get_recent_reports().await?;
            print_json(&reports)?;
        }
        "incident" => {
            let event_id = require_event_id(&args)?;
            let crash = settled(queries.crash(event_id).await, "crash")?;
            let chain = match queries.custody_chain(event_id).await {
                QueryState::Data(chain) => chain,
                _ => Arc::new(Vec::new()),
            };
            print!("{}", IncidentReport::build(&crash, &chain));
        }
        "browse" => {
            let crashes = settled(queries.crashes(&server_filters).await, "crashes")?;
            let initial: Vec<CrashEvent> = filter(&crashes, &criteria);
            let chosen = forensic_edr_rs::ui::run_crash_browser(initial)
                .await
                .map_err(|e| anyhow!("terminal UI failed: {}", e))?;
            if let Some(crash) = chosen {
                let detail = settled(queries.crash(&crash.event_id).await, "crash")?;
                let chain = match queries.custody_chain(&crash.event_id).await {
                    QueryState::Data(chain) => chain,
                    _ => Arc::new(Vec::new()),
                };
                print!("{}", IncidentReport::build(&detail, &chain));
            }
        }
        _ => {
            eprintln!("Unknown command: {}", args.command);
            eprintln!(
                "Available commands: list_crashes, get_crash, nearby, custody, custody_all, kpis, hotspots, timeline, overview, telemetry, report, recent_reports, incident, browse"
            );
            std::process::exit(1);
        }
    }

    Ok(())
}
