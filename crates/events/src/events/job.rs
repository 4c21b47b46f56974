use pkgjob_types::RestartKind;
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Phase a job is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Setup,
    Query,
    WaitingForLock,
    LoadingCache,
    Running,
    DownloadChangelog,
    RefreshCache,
    Download,
    Install,
    Remove,
    Update,
    Cancel,
    Finished,
}

/// Job lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Terminal error of the job, sent once before the operation returns
    ErrorCode { failure: FailureContext },

    /// A changed package needs a restart to take effect
    RequireRestart {
        kind: RestartKind,
        package_id: String,
    },

    /// The job completed, successfully or not
    Finished { success: bool },
}
