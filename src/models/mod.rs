pub mod crash;
pub mod custody;
pub mod report;
pub mod serde_helpers;
pub mod telemetry;

// ===== MODELS AS RETURNED BY THE FORENSICEDR API =====
// Every struct is `#[serde(default)]`: the API may omit any field, and a
// partially-populated record must still decode and degrade to neutral values.

pub use crash::{
    CalculatedValues, CrashEvent, CrashFilters, CrashLocation, CrashMetadata, CrashType, Severity,
};
pub(crate) use crash::CrashEnvelope;
pub use custody::{CustodyAction, CustodyActor, EvidenceCustodyLog};
pub use report::{
    HotspotBucket, ImpactSample, ReportData, ReportPayload, ReportType, TimelineBucket,
};
pub use telemetry::TelemetryPoint;
