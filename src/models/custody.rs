use serde::{Deserialize, Serialize};

use super::serde_helpers::null_to_default;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyAction {
    EvidenceCollection,
    Transfer,
    Access,
    #[default]
    #[serde(other)]
    Other,
}

impl From<&str> for CustodyAction {
    fn from(s: &str) -> Self {
        match s {
            "EVIDENCE_COLLECTION" => CustodyAction::EvidenceCollection,
            "TRANSFER" => CustodyAction::Transfer,
            "ACCESS" => CustodyAction::Access,
            _ => CustodyAction::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyActor {
    #[serde(rename = "EDGE_DEVICE_V2")]
    EdgeDeviceV2,
    CloudApi,
    #[default]
    #[serde(other)]
    Other,
}

/// Entry of the hash-chained evidence audit trail.
///
/// The hashes and `verified` flag are displayed as received; nothing here
/// recomputes or checks the chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceCustodyLog {
    #[serde(deserialize_with = "null_to_default")]
    pub entry_id: String,
    #[serde(deserialize_with = "null_to_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_to_default")]
    pub event_id: String,
    #[serde(deserialize_with = "null_to_default")]
    pub action: CustodyAction,
    #[serde(deserialize_with = "null_to_default")]
    pub actor: CustodyActor,
    #[serde(deserialize_with = "null_to_default")]
    pub location: String,
    #[serde(deserialize_with = "null_to_default")]
    pub previous_hash: String,
    #[serde(deserialize_with = "null_to_default")]
    pub entry_hash: String,
    #[serde(deserialize_with = "null_to_default")]
    pub verified: bool,
}
