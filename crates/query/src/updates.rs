//! Available updates and their advisory details

use async_trait::async_trait;
use pkgjob_errors::Error;
use pkgjob_events::UpdateDetail;
use pkgjob_resolver::{is_obsoleted, DepCache};
use pkgjob_store::{PackageStore, VersionKey};
use pkgjob_types::{restart_required, DepKind, RestartKind, UpdateState, Version};

use crate::changelog::{parse_changelog, ChangelogInfo};

/// Changelog text used when none could be fetched
pub const CHANGELOG_UNAVAILABLE: &str = "Changelog for this version is not yet available";

/// Fetches the Debian changelog of a source package
#[async_trait]
pub trait ChangelogSource: Send + Sync {
    /// Changelog text of `source` at `version`
    ///
    /// # Errors
    ///
    /// Returns an error when the changelog cannot be retrieved.
    async fn fetch(&self, source: &str, version: &Version) -> Result<String, Error>;
}

/// Outcome of a simulated dist-upgrade, bucketed per package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBuckets {
    pub updates: Vec<VersionKey>,
    pub downgrades: Vec<VersionKey>,
    /// Upgradable but kept back by the resolver
    pub blocked: Vec<VersionKey>,
    pub installs: Vec<VersionKey>,
    pub removals: Vec<VersionKey>,
    pub obsoleted: Vec<VersionKey>,
}

impl UpdateBuckets {
    /// Run a dist-upgrade on a snapshot of `cache` and sort the result
    ///
    /// Held packages never appear in any bucket.
    #[must_use]
    pub fn collect(cache: &DepCache) -> Self {
        let mut snapshot = cache.clone();
        if let Err(err) = snapshot.dist_upgrade() {
            tracing::debug!(%err, "dist-upgrade left broken packages");
        }

        let store = snapshot.store();
        let mut buckets = Self::default();
        for pk in snapshot.package_keys() {
            if store.package(pk).is_held() {
                continue;
            }
            let candidate = snapshot.candidate(pk);
            let bucket = if snapshot.is_upgrade(pk) && !snapshot.is_new_install(pk) {
                &mut buckets.updates
            } else if snapshot.is_downgrade(pk) {
                &mut buckets.downgrades
            } else if snapshot.is_upgradable(pk) && snapshot.is_installed(pk) && !snapshot.is_delete(pk) {
                &mut buckets.blocked
            } else if snapshot.is_new_install(pk) {
                &mut buckets.installs
            } else if snapshot.is_delete(pk) {
                let bucket = if is_obsoleted(&snapshot, pk) {
                    &mut buckets.obsoleted
                } else {
                    &mut buckets.removals
                };
                bucket.extend(snapshot.current(pk));
                continue;
            } else {
                continue;
            };
            bucket.extend(candidate);
        }
        buckets
    }
}

/// Advisory details for updating to `candidate`
///
/// Without a changelog source the changelog is reported as unavailable.
pub async fn update_detail(
    store: &PackageStore,
    candidate: VersionKey,
    changelogs: Option<&dyn ChangelogSource>,
) -> UpdateDetail {
    let ver = store.version(candidate);
    let pkg = store.owner(candidate);
    let installed = store.find_version(ver.package);

    let info = match changelogs {
        Some(source) => match source.fetch(&ver.source, &ver.version).await {
            Ok(text) => parse_changelog(&text, &ver.source, pkg.current.map(|vk| &store.version(vk).version)),
            Err(err) => {
                tracing::debug!(source = %ver.source, %err, "changelog fetch failed");
                unavailable()
            }
        },
        None => unavailable(),
    };

    let archive = ver
        .download_origin()
        .or_else(|| ver.origins.first())
        .map_or("", |o| o.archive.as_str());
    let obsoletes = ver
        .groups(DepKind::Obsoletes)
        .flat_map(|g| &g.alternatives)
        .map(|a| store.package(a.target).name.clone())
        .collect();

    UpdateDetail {
        package_id: store.build_identifier(candidate).to_string(),
        updates: installed
            .map(|vk| store.build_identifier(vk).to_string())
            .into_iter()
            .collect(),
        obsoletes,
        vendor_urls: Vec::new(),
        bugzilla_urls: info.bugzilla_urls,
        cve_urls: info.cve_urls,
        restart: if restart_required(&pkg.name) {
            RestartKind::System
        } else {
            RestartKind::None
        },
        update_text: info.update_text,
        changelog: info.changelog,
        state: UpdateState::from_archive(archive),
        issued: info.issued,
        updated: info.updated,
    }
}

fn unavailable() -> ChangelogInfo {
    ChangelogInfo {
        changelog: CHANGELOG_UNAVAILABLE.to_string(),
        ..ChangelogInfo::default()
    }
}
