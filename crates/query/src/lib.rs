#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Read-only queries over the package store
//!
//! Every query borrows the store, returns version keys and leaves emission
//! to the caller. Long walks poll an optional [`CancelToken`] and stop early
//! once it fires.

mod changelog;
mod codec;
mod depends;
mod details;
mod filter;
mod provides;
mod search;
mod updates;

pub use changelog::{parse_changelog, ChangelogInfo};
pub use codec::CodecMatcher;
pub use details::parse_long_description;
pub use filter::{emission_versions, filter_downloaded, is_installed_version, sort_and_dedup};
pub use provides::{MimeComponent, MimeIndex, ProvidesKind};
pub use updates::{update_detail, ChangelogSource, UpdateBuckets, CHANGELOG_UNAVAILABLE};

use pkgjob_platform::CancelToken;
use pkgjob_store::PackageStore;

/// Borrowed view used by every query
#[derive(Clone, Copy)]
pub struct Query<'a> {
    store: &'a PackageStore,
    cancel: Option<&'a CancelToken>,
}

impl<'a> Query<'a> {
    #[must_use]
    pub fn new(store: &'a PackageStore) -> Self {
        Self { store, cancel: None }
    }

    /// Stop long walks once `cancel` fires
    #[must_use]
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub fn store(&self) -> &'a PackageStore {
        self.store
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }
}
