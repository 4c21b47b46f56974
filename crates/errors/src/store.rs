//! Package store and cache lifecycle error types

use std::borrow::Cow;

use crate::{ErrorCode, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StoreError {
    #[error("unable to lock {path}: {message}")]
    LockFailed { path: String, message: String },

    #[error("could not acquire the package system lock after {attempts} attempts")]
    CannotGetLock { attempts: u32 },

    #[error("an upgrade is in progress ({path} exists)")]
    UpgradeInProgress { path: String },

    #[error("failed to open the package cache: {message}")]
    OpenFailed { message: String },

    #[error("{message}")]
    PendingErrors { message: String },

    #[error("Internal error, non-zero counts")]
    InconsistentCounts,

    #[error("Unable to apply corrections for half-installed packages")]
    ApplyStatusFailed,

    #[error("{report}")]
    UnfinishedTransaction { report: String },

    #[error("package not found: {id}")]
    PackageNotFound { id: String },

    #[error("invalid package identifier: {id}")]
    InvalidIdentifier { id: String },
}

impl StoreError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::LockFailed { .. } | Self::CannotGetLock { .. } | Self::UpgradeInProgress { .. } => {
                ErrorCode::CannotGetLock
            }
            Self::OpenFailed { .. } => ErrorCode::FailedInitialization,
            Self::PendingErrors { .. } | Self::InconsistentCounts | Self::ApplyStatusFailed => {
                ErrorCode::InternalError
            }
            Self::UnfinishedTransaction { .. } => ErrorCode::UnfinishedTransaction,
            Self::PackageNotFound { .. } => ErrorCode::PackageNotFound,
            Self::InvalidIdentifier { .. } => ErrorCode::PackageIdInvalid,
        }
    }
}

impl UserFacingError for StoreError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::LockFailed { .. } | Self::CannotGetLock { .. } => {
                Some("Another package manager is running. Wait for it to finish and retry.")
            }
            Self::UpgradeInProgress { .. } => {
                Some("Wait for the system upgrade to complete before starting another job.")
            }
            Self::UnfinishedTransaction { .. } => {
                Some("Finish or repair the interrupted transaction before continuing.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        self.code().severity().is_retryable()
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(self.code().as_str())
    }
}
