use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by [`crate::client::ForensicClient`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered 404 for the requested resource.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// A successful response whose body could not be decoded.
    #[error("malformed response from {context}: {source}")]
    Malformed {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP {status} from {context}: {body}")]
    Status {
        status: StatusCode,
        context: String,
        body: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// Whether a manual retry may succeed. Malformed bodies and bad config will not fix themselves.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_) | FetchError::NotFound { .. } | FetchError::Status { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
