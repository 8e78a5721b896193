use std::time::Duration;

use url::Url;

use crate::error::{FetchError, FetchResult};

pub const DEFAULT_API_URL: &str = "https://forensicedr-cloud.onrender.com/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    base_url: Url,
    timeout: Duration,
}

impl ApiConfig {
    /// Creates a config for an explicit API origin, e.g. `http://localhost:8000/api/v1`.
    pub fn new(base_url: &str) -> FetchResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| FetchError::InvalidConfig(format!("invalid base URL {:?}: {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidConfig(format!(
                "base URL {} cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Creates a config from environment variables
    pub fn from_env() -> FetchResult<Self> {
        Self::from_env_with_url(None)
    }

    /// Creates a config from environment variables with an optional base URL override
    pub fn from_env_with_url(base_url: Option<String>) -> FetchResult<Self> {
        dotenv::dotenv().ok();

        let base_url = base_url.unwrap_or_else(|| {
            std::env::var("FORENSIC_EDR_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
        });

        let timeout_secs = match std::env::var("FORENSIC_EDR_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                FetchError::InvalidConfig(format!(
                    "FORENSIC_EDR_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self::new(&base_url)?.with_timeout(Duration::from_secs(timeout_secs)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Joins path segments onto the base URL. Segments are percent-encoded, so
    /// opaque ids containing `/` or spaces stay a single segment.
    pub fn endpoint(&self, segments: &[&str]) -> FetchResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidConfig(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
