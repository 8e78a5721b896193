use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{FetchError, FetchResult};
use crate::models::{
    CrashEnvelope, CrashEvent, CrashFilters, EvidenceCustodyLog, ReportData, ReportType,
};

/// Number of recent crashes whose custody chains make up the combined audit log.
pub const DEFAULT_CUSTODY_SAMPLE: u32 = 10;

// ===== QUERY PARAMETERS =====

#[derive(Debug, Clone, Serialize)]
struct NearbyQuery {
    lat: f64,
    lon: f64,
    radius_km: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ReportQuery {
    report_type: ReportType,
}

// ===== CLIENT IMPLEMENTATION =====

/// Thin typed wrapper over the ForensicEDR REST API.
///
/// Cloning is cheap: the underlying `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct ForensicClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl ForensicClient {
    /// Creates a new ForensicClient for the configured API origin.
    pub fn new(config: ApiConfig) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { config, http })
    }

    /// Creates a client from `FORENSIC_EDR_API_URL` (or the default origin).
    pub fn from_env() -> FetchResult<Self> {
        Self::new(ApiConfig::from_env()?)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    // ===== CRASHES =====

    /// Lists crash summaries. Summaries never carry `raw_data`.
    pub async fn get_crashes(&self, filters: &CrashFilters) -> FetchResult<Vec<CrashEvent>> {
        self.get_json(&["crashes"], Some(filters), "crash list").await
    }

    /// Fetches one crash with full telemetry. Accepts both the bare record and
    /// the `{"crash_event": {...}}` envelope.
    pub async fn get_crash(&self, event_id: &str) -> FetchResult<CrashEvent> {
        let envelope: CrashEnvelope = self
            .get_json(&["crashes", event_id], None::<&()>, &format!("crash {}", event_id))
            .await?;
        Ok(envelope.into_inner())
    }

    /// Crashes within `radius_km` of a point.
    pub async fn get_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> FetchResult<Vec<CrashEvent>> {
        let query = NearbyQuery {
            lat: latitude,
            lon: longitude,
            radius_km,
        };
        self.get_json(&["crashes", "nearby"], Some(&query), "nearby crashes").await
    }

    // ===== EVIDENCE CUSTODY =====

    pub async fn get_custody_chain(&self, event_id: &str) -> FetchResult<Vec<EvidenceCustodyLog>> {
        self.get_json(
            &["custody", event_id],
            None::<&()>,
            &format!("custody chain for {}", event_id),
        )
        .await
    }

    /// Builds a combined audit log from the chains of the `limit` most recent crashes.
    ///
    /// The API has no bulk endpoint, so chains are fetched concurrently. A chain
    /// that fails to load is skipped; failing to list the crashes is an error.
    /// Output keeps the crash listing order.
    pub async fn get_all_custody_logs(&self, limit: u32) -> FetchResult<Vec<EvidenceCustodyLog>> {
        let crashes = self
            .get_crashes(&CrashFilters::default().with_limit(limit))
            .await?;

        let mut tasks = JoinSet::new();
        for (index, crash) in crashes.into_iter().enumerate() {
            let client = self.clone();
            tasks.spawn(async move {
                let chain = client.get_custody_chain(&crash.event_id).await;
                (index, crash.event_id, chain)
            });
        }

        let mut chains = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(chain))) => chains.push((index, chain)),
                Ok((_, event_id, Err(e))) => {
                    warn!("Skipping custody chain for {}: {}", event_id, e);
                }
                Err(e) => warn!("Custody chain task failed: {}", e),
            }
        }

        chains.sort_by_key(|(index, _)| *index);
        Ok(chains.into_iter().flat_map(|(_, chain)| chain).collect())
    }

    // ===== REPORTS =====

    pub async fn generate_report(&self, report_type: ReportType) -> FetchResult<ReportData> {
        let query = ReportQuery { report_type };
        self.get_json(
            &["reports", "generate"],
            Some(&query),
            &format!("{} report", report_type),
        )
        .await
    }

    pub async fn get_recent_reports(&self) -> FetchResult<Vec<ReportData>> {
        self.get_json(&["reports", "cached", "recent"], None::<&()>, "recent reports")
            .await
    }

    /// Returns the most recent cached report of `report_type`, generating one if none is cached.
    pub async fn get_report(&self, report_type: ReportType) -> FetchResult<ReportData> {
        let recent = self.get_recent_reports().await?;
        if let Some(found) = recent.into_iter().find(|r| r.report_type == report_type) {
            debug!("Using cached {} report {}", report_type, found.report_id);
            return Ok(found);
        }

        debug!("No cached {} report, generating", report_type);
        self.generate_report(report_type).await
    }

    // ===== HELPER METHODS =====

    /// Issues a GET and decodes the JSON body, mapping 404 and other statuses to [`FetchError`].
    async fn get_json<T, Q>(
        &self,
        segments: &[&str],
        query: Option<&Q>,
        resource: &str,
    ) -> FetchResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.config.endpoint(segments)?;
        let mut request = self.http.get(url.clone());
        if let Some(query) = query {
            request = request.query(query);
        }

        debug!("GET {}", url);
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                resource: resource.to_string(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                context: resource.to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Malformed {
            context: resource.to_string(),
            source,
        })
    }
}
