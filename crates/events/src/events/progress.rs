use serde::{Deserialize, Serialize};

use super::Status;

/// Job-wide progress and status notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The job moved into a new phase
    StatusChanged { status: Status },

    /// Overall percentage, `None` means the job cannot estimate it
    Percentage { value: Option<u8> },

    /// Per-package progress inside a download or install phase
    ItemProgress {
        package_id: String,
        status: Status,
        percentage: u8,
    },

    /// Whether a cancel request will still be honoured
    AllowCancel { allowed: bool },

    /// Bytes left to download for the transaction
    DownloadSizeRemaining { bytes: u64 },

    /// Current download rate
    Speed { bytes_per_second: u64 },
}
