//! Types for operations

use serde::{Deserialize, Serialize};

/// Switches a caller sets per transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFlags {
    /// Report the changes without fetching or installing
    #[serde(default)]
    pub simulate: bool,
    /// Fetch the archives and stop
    #[serde(default)]
    pub download_only: bool,
}

impl TransactionFlags {
    #[must_use]
    pub fn simulate() -> Self {
        Self {
            simulate: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn download_only() -> Self {
        Self {
            download_only: true,
            ..Self::default()
        }
    }
}
