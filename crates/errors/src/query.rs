//! Query layer error types

use std::borrow::Cow;

use crate::{ErrorCode, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum QueryError {
    #[error("An empty group was received")]
    EmptyGroup,

    #[error("Failed to load AppStream metadata: {message}")]
    MetadataLoadFailed { message: String },
}

impl QueryError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyGroup => ErrorCode::GroupNotFound,
            Self::MetadataLoadFailed { .. } => ErrorCode::InternalError,
        }
    }
}

impl UserFacingError for QueryError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(self.code().as_str())
    }
}
