//! Dependency resolution error types

use std::borrow::Cow;

use crate::{ErrorCode, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ResolverError {
    /// Resolution left the cache in an inconsistent state. The message is
    /// usually the unmet-dependency report.
    #[error("{message}")]
    DepResolutionFailed { message: String },

    #[error("Package {package} is virtual and has no installation candidate")]
    NoCandidate { package: String },

    #[error("WARNING: You are trying to remove the following essential packages: {packages}")]
    CannotRemoveSystemPackage { packages: String },

    /// The scored resolver gave up with packages still broken.
    #[error("unable to resolve {broken} broken packages")]
    Unresolvable { broken: usize },
}

impl ResolverError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DepResolutionFailed { .. }
            | Self::NoCandidate { .. }
            | Self::Unresolvable { .. } => ErrorCode::DepResolutionFailed,
            Self::CannotRemoveSystemPackage { .. } => ErrorCode::CannotRemoveSystemPackage,
        }
    }
}

impl UserFacingError for ResolverError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CannotRemoveSystemPackage { .. } => {
                Some("Essential packages cannot be removed by a regular transaction.")
            }
            Self::NoCandidate { .. } => Some("Install one of the packages providing it instead."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(self.code().as_str())
    }
}
