#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the pkgjob transaction engine
//!
//! This crate provides fine-grained error types organized by domain.
//! Every error maps to a stable [`ErrorCode`] that is reported to the
//! client as the terminal error event of a job.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod pending;
pub mod query;
pub mod resolver;
pub mod store;
pub mod structured;
pub mod transaction;
pub mod version;

// Re-export all error types at the root
pub use config::ConfigError;
pub use pending::{PendingErrors, PendingKind, PendingMessage};
pub use query::QueryError;
pub use resolver::ResolverError;
pub use store::StoreError;
pub use structured::{ErrorCode, ErrorSeverity};
pub use transaction::TransactionError;
pub use version::VersionError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Resolver(#[from] ResolverError),

    #[error("{0}")]
    Transaction(#[from] TransactionError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("version error: {0}")]
    Version(#[from] VersionError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {message}")]
    Io {
        #[cfg_attr(feature = "serde", serde(with = "io_kind_as_str"))]
        kind: std::io::ErrorKind,
        message: String,
        #[cfg_attr(feature = "serde", serde(with = "opt_path_buf"))]
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// Create an Io error with a custom message and an associated path
    pub fn io_message(
        kind: std::io::ErrorKind,
        message: impl Into<String>,
        path: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self::Io {
            kind,
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Stable code reported to clients for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Store(err) => err.code(),
            Error::Resolver(err) => err.code(),
            Error::Transaction(err) => err.code(),
            Error::Query(err) => err.code(),
            Error::Version(_) => ErrorCode::PackageIdInvalid,
            Error::Config(_) => ErrorCode::FailedConfigParsing,
            Error::Internal(_) | Error::Io { .. } => ErrorCode::InternalError,
            Error::Cancelled => ErrorCode::TransactionCancelled,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for pkgjob operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for the client's error event.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Store(err) => err.user_message(),
            Error::Resolver(err) => err.user_message(),
            Error::Transaction(err) => err.user_message(),
            Error::Query(err) => err.user_message(),
            Error::Internal(message) => Cow::Borrowed(message.as_str()),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Store(err) => err.user_hint(),
            Error::Resolver(err) => err.user_hint(),
            Error::Transaction(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
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

// Serde helper modules for optional path and io::ErrorKind as string
#[cfg(feature = "serde")]
mod io_kind_as_str {
    use serde::{Deserialize, Deserializer, Serializer};
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(kind: &std::io::ErrorKind, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&format!("{kind:?}"))
    }
    pub fn deserialize<'de, D>(deserializer: D) -> Result<std::io::ErrorKind, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "NotFound" => std::io::ErrorKind::NotFound,
            "PermissionDenied" => std::io::ErrorKind::PermissionDenied,
            "AlreadyExists" => std::io::ErrorKind::AlreadyExists,
            "WouldBlock" => std::io::ErrorKind::WouldBlock,
            "InvalidInput" => std::io::ErrorKind::InvalidInput,
            "InvalidData" => std::io::ErrorKind::InvalidData,
            "TimedOut" => std::io::ErrorKind::TimedOut,
            "Interrupted" => std::io::ErrorKind::Interrupted,
            "Unsupported" => std::io::ErrorKind::Unsupported,
            "UnexpectedEof" => std::io::ErrorKind::UnexpectedEof,
            "StorageFull" => std::io::ErrorKind::StorageFull,
            _ => std::io::ErrorKind::Other,
        })
    }
}

#[cfg(feature = "serde")]
mod opt_path_buf {
    use serde::{Deserialize, Deserializer, Serializer};
    #[allow(clippy::ref_option)]
    pub fn serialize<S>(path: &Option<std::path::PathBuf>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match path {
            Some(pb) => s.serialize_some(&pb.display().to_string()),
            None => s.serialize_none(),
        }
    }
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<std::path::PathBuf>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<String>::deserialize(deserializer)?;
        Ok(opt.map(std::path::PathBuf::from))
    }
}
