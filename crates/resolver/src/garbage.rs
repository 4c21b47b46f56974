//! Unused automatically installed packages

use std::collections::BTreeSet;

use pkgjob_store::PackageKey;
use pkgjob_types::DepKind;

use crate::depcache::DepCache;

/// Packages that would be left installed with nothing needing them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GarbageSet(BTreeSet<PackageKey>);

impl GarbageSet {
    #[must_use]
    pub fn contains(&self, pk: PackageKey) -> bool {
        self.0.contains(&pk)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PackageKey> + '_ {
        self.0.iter().copied()
    }

    /// Members of `self` missing from `baseline`
    #[must_use]
    pub fn difference(&self, baseline: &GarbageSet) -> Vec<PackageKey> {
        self.0.difference(&baseline.0).copied().collect()
    }
}

impl DepCache {
    /// Mark and sweep from the manually installed and system packages
    pub fn garbage(&mut self) -> GarbageSet {
        let store = std::sync::Arc::clone(self.shared_store());
        let mut reached = vec![false; store.package_count()];
        let mut stack: Vec<PackageKey> = store
            .packages()
            .filter(|&(pk, pkg)| {
                self.install_version(pk).is_some() && (!self.is_auto(pk) || pkg.is_system())
            })
            .map(|(pk, _)| pk)
            .collect();

        while let Some(pk) = stack.pop() {
            if std::mem::replace(&mut reached[pk.index()], true) {
                continue;
            }
            let Some(vk) = self.install_version(pk) else {
                continue;
            };
            let deps = store.version(vk).depends.iter().filter(|g| {
                matches!(
                    g.kind,
                    DepKind::Depends | DepKind::PreDepends | DepKind::Recommends
                )
            });
            for atom in deps.flat_map(|g| &g.alternatives) {
                if self.install_version(atom.target).is_some() && !reached[atom.target.index()] {
                    stack.push(atom.target);
                }
                for provider in store.providers(atom.target) {
                    let owner = store.version(provider.version).package;
                    if self.install_version(owner) == Some(provider.version)
                        && !reached[owner.index()]
                    {
                        stack.push(owner);
                    }
                }
            }
        }

        let mut set = BTreeSet::new();
        for (pk, pkg) in store.packages() {
            let garbage = self.install_version(pk).is_some()
                && self.is_auto(pk)
                && !pkg.is_system()
                && !reached[pk.index()];
            self.set_garbage(pk, garbage);
            if garbage {
                set.insert(pk);
            }
        }
        tracing::debug!(count = set.len(), "computed garbage set");
        GarbageSet(set)
    }
}
