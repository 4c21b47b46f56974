//! Result filtering and emission expansion

use std::collections::HashSet;
use std::path::Path;

use pkgjob_resolver::{install_order, DepCache, StepAction};
use pkgjob_store::{archive_file_name, PackageStore, VersionKey};
use pkgjob_types::{CurrentState, Filter, FilterSet};

use crate::Query;

const DEVEL_SUFFIXES: [&str; 4] = ["-devel", "-devel-static", "-debuginfo", "-checkinstall"];
const DEVEL_SECTIONS: [&str; 2] = ["devel", "libdevel"];
const GUI_SECTIONS: [&str; 4] = ["x11", "gnome", "kde", "graphics"];
const FREE_COMPONENTS: [&str; 2] = ["main", "universe"];

/// Sort by (name, version, arch) and drop exact duplicates
pub fn sort_and_dedup(store: &PackageStore, versions: &mut Vec<VersionKey>) {
    versions.sort_by(|&a, &b| {
        let (va, vb) = (store.version(a), store.version(b));
        store
            .owner(a)
            .name
            .cmp(&store.owner(b).name)
            .then_with(|| va.version.cmp(&vb.version))
            .then_with(|| va.arch.cmp(&vb.arch))
            .then_with(|| a.cmp(&b))
    });
    versions.dedup();
}

/// Installed means the package is fully installed at exactly this version
#[must_use]
pub fn is_installed_version(store: &PackageStore, vk: VersionKey) -> bool {
    let pkg = store.owner(vk);
    pkg.current_state == CurrentState::Installed && pkg.current == Some(vk)
}

impl Query<'_> {
    /// Whether `vk` passes every predicate in `filters`
    ///
    /// Downloaded and the newest filters are not predicates; they are
    /// applied by [`filter_downloaded`] and [`emission_versions`].
    #[must_use]
    pub fn matches(&self, vk: VersionKey, filters: FilterSet) -> bool {
        let store = self.store;
        let ver = store.version(vk);
        let name = store.owner(vk).name.as_str();
        let section = ver.section_name();

        let installed = is_installed_version(store, vk);
        let devel = DEVEL_SUFFIXES.iter().any(|s| name.ends_with(s)) || DEVEL_SECTIONS.contains(&section);
        let gui = GUI_SECTIONS.contains(&section);
        let free = FREE_COMPONENTS.contains(&ver.component());
        let native = ver.arch == store.native_arch() || ver.arch == "all";

        // For these pairs the positive filter wins when both are requested
        let either = |positive: Filter, negative: Filter, holds: bool| {
            if filters.contains(positive) {
                holds
            } else {
                !filters.contains(negative) || !holds
            }
        };

        let both = |positive: Filter, negative: Filter, holds: bool| {
            (holds || !filters.contains(positive)) && (!holds || !filters.contains(negative))
        };

        both(Filter::Installed, Filter::NotInstalled, installed)
            && both(Filter::Arch, Filter::NotArch, native)
            && either(Filter::Development, Filter::NotDevelopment, devel)
            && either(Filter::Gui, Filter::NotGui, gui)
            && either(Filter::Free, Filter::NotFree, free)
    }

    /// Sort, de-duplicate and apply the predicate filters
    #[must_use]
    pub fn filter(&self, mut versions: Vec<VersionKey>, filters: FilterSet) -> Vec<VersionKey> {
        sort_and_dedup(self.store, &mut versions);
        if filters.is_empty() {
            return versions;
        }
        versions.retain(|&vk| self.matches(vk, filters));
        versions
    }
}

/// Keep the versions whose archive is already complete in `archive_dir`
///
/// The versions are marked for installation on a throwaway snapshot of
/// `cache`, so only archives the transaction would actually fetch count.
/// With `keep_downloaded` false the complement is returned instead.
#[must_use]
pub fn filter_downloaded(
    cache: &DepCache,
    versions: &[VersionKey],
    archive_dir: &Path,
    keep_downloaded: bool,
) -> Vec<VersionKey> {
    if versions.is_empty() {
        return Vec::new();
    }

    let mut snapshot = cache.clone();
    for auto_inst in [true, false] {
        for &vk in versions {
            let pk = snapshot.store().version(vk).package;
            snapshot.set_candidate(vk);
            snapshot.mark_install(pk, auto_inst, false);
        }
    }

    let store = snapshot.store();
    let local: HashSet<VersionKey> = install_order(&snapshot)
        .into_iter()
        .filter(|step| step.action == StepAction::Install)
        .map(|step| step.version)
        .filter(|&vk| {
            let ver = store.version(vk);
            let path = archive_dir.join(archive_file_name(&store.owner(vk).name, ver));
            std::fs::metadata(&path).is_ok_and(|m| m.len() == ver.download_size)
        })
        .collect();

    versions
        .iter()
        .copied()
        .filter(|vk| local.contains(vk) == keep_downloaded)
        .collect()
}

/// Expand a result list into the versions actually emitted
///
/// Newest, or an emission that is not multi-version, emits the listed
/// version only. Otherwise the listed version and every older one are
/// emitted, and not-newest drops the listed version itself.
#[must_use]
pub fn emission_versions(
    store: &PackageStore,
    versions: &[VersionKey],
    filters: FilterSet,
    multiversion: bool,
) -> Vec<VersionKey> {
    if !multiversion || filters.contains(Filter::Newest) {
        return versions.to_vec();
    }
    let skip_chosen = filters.contains(Filter::NotNewest);

    let mut out = Vec::new();
    for &vk in versions {
        let all = &store.owner(vk).versions;
        let start = all.iter().position(|&v| v == vk).unwrap_or(0);
        let start = if skip_chosen { start + 1 } else { start };
        out.extend(all.iter().skip(start).copied());
    }
    out
}
