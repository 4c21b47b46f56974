//! Turning resolver marks into steps and downloads

use std::path::Path;

use pkgjob_errors::{Error, TransactionError};
use pkgjob_resolver::{install_order, DepCache, InstallStep, StepAction};
use pkgjob_store::{archive_file_name, archive_uri, VersionKey};

use crate::fetch::{FetchItem, FetchTotals};

/// Ordered steps plus the archives that still have to be fetched
#[derive(Debug, Clone, Default)]
pub struct FetchPlan {
    pub steps: Vec<InstallStep>,
    pub items: Vec<FetchItem>,
    /// Install steps whose archive is already complete on disk
    pub cached: Vec<VersionKey>,
    pub totals: FetchTotals,
}

impl FetchPlan {
    /// Plan the marks in `cache` against the contents of `archive_dir`
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::MissingArchive` when a version to install
    /// has no downloadable origin, and `TransactionError::CorruptedIndex`
    /// when its record lacks a file name.
    pub fn build(cache: &DepCache, archive_dir: &Path) -> Result<Self, Error> {
        let store = cache.store();
        let mut plan = Self {
            steps: install_order(cache),
            ..Self::default()
        };

        for step in &plan.steps {
            if step.action != StepAction::Install {
                continue;
            }
            let vk = step.version;
            let ver = store.version(vk);
            let name = &store.owner(vk).name;

            if !ver.is_downloadable() {
                return Err(TransactionError::MissingArchive {
                    package: name.clone(),
                }
                .into());
            }
            let Some(uri) = archive_uri(ver) else {
                return Err(TransactionError::CorruptedIndex {
                    package: name.clone(),
                }
                .into());
            };

            let file_name = archive_file_name(name, ver);
            let destination = archive_dir.join(&file_name);
            if file_len(&destination) == Some(ver.download_size) {
                tracing::debug!(path = %destination.display(), "archive already cached");
                plan.totals.total_needed += ver.download_size;
                plan.cached.push(vk);
                continue;
            }

            let partial = file_len(&archive_dir.join("partial").join(&file_name))
                .filter(|&len| len < ver.download_size)
                .unwrap_or(0);

            let item = FetchItem {
                uri,
                destination,
                hash: ver.hash.clone(),
                size: ver.download_size,
                description: format!("{name} {}", ver.version),
                version: vk,
                package_id: store.build_identifier(vk).to_string(),
                partial,
            };
            plan.totals.add(&item);
            plan.items.push(item);
        }

        Ok(plan)
    }

    #[must_use]
    pub fn fetch_needed(&self) -> u64 {
        self.totals.fetch_needed
    }

    #[must_use]
    pub fn partial_present(&self) -> u64 {
        self.totals.partial_present
    }

    #[must_use]
    pub fn total_needed(&self) -> u64 {
        self.totals.total_needed
    }
}

fn file_len(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}
