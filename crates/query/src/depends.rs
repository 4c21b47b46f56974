//! Forward and reverse dependency listings

use std::collections::HashSet;

use pkgjob_store::{PackageKey, VersionKey};
use pkgjob_types::DepKind;

use crate::Query;

impl Query<'_> {
    /// Versions of the packages `vk` depends on
    ///
    /// With `recursive`, the dependencies of each found version are walked
    /// as well. A package is listed at most once.
    #[must_use]
    pub fn get_depends(&self, vk: VersionKey, recursive: bool) -> Vec<VersionKey> {
        let mut seen = HashSet::from([self.store.version(vk).package]);
        let mut out = Vec::new();
        self.collect_depends(vk, recursive, &mut seen, &mut out);
        out
    }

    fn collect_depends(
        &self,
        vk: VersionKey,
        recursive: bool,
        seen: &mut HashSet<PackageKey>,
        out: &mut Vec<VersionKey>,
    ) {
        let store = self.store;
        let targets: Vec<PackageKey> = store
            .version(vk)
            .groups(DepKind::Depends)
            .flat_map(|g| g.alternatives.iter().map(|a| a.target))
            .collect();

        for target in targets {
            if self.cancelled() {
                return;
            }
            let Some(dep) = store.find_version(target) else {
                continue;
            };
            if !seen.insert(target) {
                continue;
            }
            out.push(dep);
            if recursive {
                self.collect_depends(dep, recursive, seen, out);
            }
        }
    }

    /// Versions of the packages that depend on `vk`'s package
    #[must_use]
    pub fn get_requires(&self, vk: VersionKey, recursive: bool) -> Vec<VersionKey> {
        let mut seen = HashSet::from([self.store.version(vk).package]);
        let mut out = Vec::new();
        self.collect_requires(vk, recursive, &mut seen, &mut out);
        out
    }

    fn collect_requires(
        &self,
        vk: VersionKey,
        recursive: bool,
        seen: &mut HashSet<PackageKey>,
        out: &mut Vec<VersionKey>,
    ) {
        let store = self.store;
        let pk = store.version(vk).package;
        // Dependents resolve a target to its listed version, nothing else matches
        if store.find_version(pk) != Some(vk) {
            return;
        }
        for rev in store.reverse_depends(pk) {
            if self.cancelled() {
                return;
            }
            if rev.kind != DepKind::Depends {
                continue;
            }
            let dependent = store.version(rev.version).package;
            // Only the version the dependent package would be listed as counts
            if store.find_version(dependent) != Some(rev.version) {
                continue;
            }
            if !seen.insert(dependent) {
                continue;
            }
            out.push(rev.version);
            if recursive {
                self.collect_requires(rev.version, recursive, seen, out);
            }
        }
    }
}
