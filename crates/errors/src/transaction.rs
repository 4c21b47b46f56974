//! Transaction execution error types

use std::borrow::Cow;

use crate::{ErrorCode, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum TransactionError {
    #[error("Unable to lock the download directory")]
    DownloadDirLocked { path: String },

    #[error("I wasn't able to locate a file for the {package} package. This might mean you need to manually fix this package.")]
    MissingArchive { package: String },

    #[error("The package index files are corrupted. No Filename: field for package {package}.")]
    CorruptedIndex { package: String },

    #[error("{message}")]
    DownloadFailed { message: String },

    #[error("Cannot download packages whilst offline")]
    NoNetwork,

    #[error("You don't have enough free space in {path}")]
    NoSpaceOnDevice { path: String },

    #[error("installation failed: {message}")]
    InstallFailed { message: String },
}

impl TransactionError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DownloadDirLocked { .. } => ErrorCode::CannotGetLock,
            Self::MissingArchive { .. } | Self::DownloadFailed { .. } => {
                ErrorCode::PackageDownloadFailed
            }
            Self::CorruptedIndex { .. } => ErrorCode::InternalError,
            Self::NoNetwork => ErrorCode::NoNetwork,
            Self::NoSpaceOnDevice { .. } => ErrorCode::NoSpaceOnDevice,
            Self::InstallFailed { .. } => ErrorCode::TransactionError,
        }
    }
}

impl UserFacingError for TransactionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoNetwork => Some("Connect to a network and retry the transaction."),
            Self::NoSpaceOnDevice { .. } => {
                Some("Free disk space in the archive directory and retry.")
            }
            Self::CorruptedIndex { .. } => Some("Refresh the package cache."),
            Self::DownloadFailed { .. } => Some("Check repository availability and retry."),
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
