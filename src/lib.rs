//! Client, query cache and dashboard derivations for the ForensicEDR
//! vehicle-crash telemetry API.

pub mod analytics;
pub mod charts;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod incident;
pub mod models;
pub mod query;
pub mod ui;

pub use client::ForensicClient;
pub use config::ApiConfig;
pub use error::{FetchError, FetchResult};
pub use query::{CrashQueries, QueryCache, QueryState};
