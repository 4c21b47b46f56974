use chrono::{DateTime, Utc};
use pkgjob_types::{Group, InfoKind, RestartKind, UpdateState};
use serde::{Deserialize, Serialize};

/// Descriptive data for one package version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDetails {
    pub package_id: String,
    pub summary: String,
    pub description: String,
    pub group: Group,
    pub section: String,
    /// Installed size when installed, download size otherwise
    pub size: u64,
}

/// Advisory data for an available update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDetail {
    pub package_id: String,
    pub updates: Vec<String>,
    pub obsoletes: Vec<String>,
    pub vendor_urls: Vec<String>,
    pub bugzilla_urls: Vec<String>,
    pub cve_urls: Vec<String>,
    pub restart: RestartKind,
    pub update_text: String,
    pub changelog: String,
    pub state: UpdateState,
    pub issued: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// Package-level results of queries and transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PackageEvent {
    /// One package in a result list
    Emitted {
        info: InfoKind,
        package_id: String,
        summary: String,
    },

    Details(PackageDetails),

    UpdateDetail(UpdateDetail),
}
