//! Stable error codes surfaced to job clients

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable error codes shared across the engine and surfaced to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ErrorCode {
    CannotGetLock,
    InternalError,
    DepResolutionFailed,
    CannotRemoveSystemPackage,
    PackageDownloadFailed,
    NoNetwork,
    NoSpaceOnDevice,
    UnfinishedTransaction,
    GroupNotFound,
    PackageNotFound,
    PackageIdInvalid,
    TransactionError,
    TransactionCancelled,
    FailedInitialization,
    FailedConfigParsing,
}

impl ErrorCode {
    /// Wire identifier of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CannotGetLock => "cannot-get-lock",
            Self::InternalError => "internal-error",
            Self::DepResolutionFailed => "dep-resolution-failed",
            Self::CannotRemoveSystemPackage => "cannot-remove-system-package",
            Self::PackageDownloadFailed => "package-download-failed",
            Self::NoNetwork => "no-network",
            Self::NoSpaceOnDevice => "no-space-on-device",
            Self::UnfinishedTransaction => "unfinished-transaction",
            Self::GroupNotFound => "group-not-found",
            Self::PackageNotFound => "package-not-found",
            Self::PackageIdInvalid => "package-id-invalid",
            Self::TransactionError => "transaction-error",
            Self::TransactionCancelled => "transaction-cancelled",
            Self::FailedInitialization => "failed-initialization",
            Self::FailedConfigParsing => "failed-config-parsing",
        }
    }

    /// Severity drives client messaging and retry policy.
    #[must_use]
    pub fn severity(self) -> ErrorSeverity {
        match self {
            Self::CannotGetLock
            | Self::PackageDownloadFailed
            | Self::NoNetwork
            | Self::NoSpaceOnDevice => ErrorSeverity::Recoverable,
            Self::TransactionCancelled => ErrorSeverity::Info,
            _ => ErrorSeverity::Fatal,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity is used to drive UI messaging and retry/backoff policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorSeverity {
    Info,
    Warning,
    Recoverable,
    Fatal,
}

impl ErrorSeverity {
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Recoverable)
    }
}
