//! Scored problem resolver
//!
//! Repairs broken marks by keeping back, installing or removing packages,
//! visiting important packages first. Protected packages are never touched.

use pkgjob_errors::{Error, ResolverError};
use pkgjob_store::PackageKey;
use pkgjob_types::{DepKind, Priority};

use crate::depcache::{DepCache, Mode, Which};

const MAX_PASSES: usize = 10;

pub struct ProblemResolver<'a> {
    cache: &'a mut DepCache,
}

impl<'a> ProblemResolver<'a> {
    pub fn new(cache: &'a mut DepCache) -> Self {
        Self { cache }
    }

    /// Freeze the current mark of a package
    pub fn protect(&mut self, pk: PackageKey) {
        self.cache.set_protected(pk, true);
    }

    /// Drop protection and removal flags
    pub fn clear(&mut self, pk: PackageKey) {
        self.cache.set_protected(pk, false);
        self.cache.set_remove_requested(pk, false);
    }

    /// Record that the package is meant to go away
    pub fn remove(&mut self, pk: PackageKey) {
        self.cache.set_remove_requested(pk, true);
    }

    /// Repair broken packages
    ///
    /// With `force` false, packages that are already broken on the installed
    /// system are left alone.
    pub fn resolve(&mut self, force: bool) -> Result<(), Error> {
        let scores = self.scores();

        for pass in 0..MAX_PASSES {
            let mut broken: Vec<PackageKey> = self
                .cache
                .package_keys()
                .filter(|&pk| self.cache.inst_broken(pk))
                .filter(|&pk| force || !self.cache.now_broken(pk))
                .collect();
            if broken.is_empty() {
                break;
            }
            broken.sort_by(|a, b| scores[b.index()].cmp(&scores[a.index()]).then(a.cmp(b)));

            let mut changed = false;
            for pk in broken {
                if self.cache.inst_broken(pk) {
                    changed |= self.fix(pk, &scores);
                }
            }
            tracing::trace!(pass, changed, "problem resolver pass");
            if !changed {
                break;
            }
        }

        match self.cache.broken_count() {
            0 => Ok(()),
            broken => Err(ResolverError::Unresolvable { broken }.into()),
        }
    }

    fn scores(&self) -> Vec<i32> {
        let store = self.cache.store();
        store
            .packages()
            .map(|(pk, pkg)| {
                let mut score: i32 = match store.find_version(pk).map(|vk| store.version(vk).priority) {
                    Some(Priority::Required) => 3,
                    Some(Priority::Important) => 2,
                    Some(Priority::Standard) => 1,
                    Some(Priority::Extra) => -1,
                    Some(Priority::Optional) | None => 0,
                };
                if pkg.essential {
                    score += 100;
                }
                if pkg.current.is_some() {
                    score += 1;
                }
                let rdeps = store
                    .reverse_depends(pk)
                    .iter()
                    .filter(|r| matches!(r.kind, DepKind::Depends | DepKind::PreDepends))
                    .count();
                score.saturating_add(i32::try_from(rdeps).unwrap_or(i32::MAX))
            })
            .collect()
    }

    fn fix(&mut self, pk: PackageKey, scores: &[i32]) -> bool {
        let protected = self.cache.is_protected(pk);

        if !protected && (self.cache.is_upgrade(pk) || self.cache.is_new_install(pk)) {
            let before = self.cache.state(pk).clone();
            self.cache.mark_keep(pk);
            if !self.cache.inst_broken(pk) {
                return true;
            }
            self.cache.restore(pk, before);
        }

        let mut changed = false;
        if let Some(vk) = self.cache.install_version(pk) {
            let store = std::sync::Arc::clone(self.cache.shared_store());
            for group in &store.version(vk).depends {
                if self.cache.group_holds(pk, group, Which::Install) {
                    continue;
                }
                if group.kind.is_positive() {
                    let target = group
                        .alternatives
                        .iter()
                        .find_map(|atom| self.cache.installable(atom))
                        .filter(|&t| t != pk && !self.cache.is_protected(t));
                    if let Some(target) = target {
                        let before = self.cache.mode(target);
                        self.cache.mark_install(target, true, false);
                        changed |= self.cache.mode(target) != before;
                    }
                } else {
                    for other in self.cache.conflicting(pk, group, Which::Install) {
                        if self.cache.is_protected(other) || scores[other.index()] > scores[pk.index()]
                        {
                            continue;
                        }
                        if self.cache.is_installed(other) {
                            self.cache.mark_delete(other, false);
                        } else {
                            self.cache.mark_keep(other);
                        }
                        changed = true;
                    }
                }
            }
        }

        if self.cache.inst_broken(pk) && !protected {
            if self.cache.is_new_install(pk) {
                self.cache.mark_keep(pk);
                changed = true;
            } else if self.cache.is_installed(pk) && self.cache.mode(pk) != Mode::Delete {
                tracing::debug!(package = %self.cache.store().package(pk).name, "removing unfixable package");
                self.cache.mark_delete(pk, false);
                changed = true;
            }
        }
        changed
    }
}
