//! Per-transaction resolver state
//!
//! A [`DepCache`] pairs the shared, immutable store with a side table of
//! marks, one entry per package. Cloning it is the way to take a throwaway
//! snapshot: the store is behind an `Arc`, only the side table is copied.

use std::sync::Arc;

use pkgjob_store::{DepAtom, DepGroup, PackageKey, PackageStore, Provider, VersionKey};
use pkgjob_types::DepKind;
use serde::{Deserialize, Serialize};

/// Recursion limit for automatic dependency installation
pub const MAX_INSTALL_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Keep,
    Install,
    Delete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageState {
    pub mode: Mode,
    pub candidate: Option<VersionKey>,
    /// Frozen against changes by the problem resolver
    pub protected: bool,
    /// Requested for removal; the problem resolver must not bring it back
    pub remove_requested: bool,
    pub auto_installed: bool,
    pub purge: bool,
    pub reinstall: bool,
    pub garbage: bool,
}

/// Which version of a package a dependency check looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Which {
    /// The installed version
    Now,
    /// The version the package will have after the transaction
    Install,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    pub install_recommends: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            install_recommends: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DepCache {
    store: Arc<PackageStore>,
    states: Vec<PackageState>,
    options: CacheOptions,
}

impl DepCache {
    #[must_use]
    pub fn new(store: Arc<PackageStore>, options: CacheOptions) -> Self {
        let states = store
            .packages()
            .map(|(_, pkg)| PackageState {
                candidate: pkg.candidate,
                auto_installed: pkg.auto_installed,
                ..PackageState::default()
            })
            .collect();
        Self {
            store,
            states,
            options,
        }
    }

    #[must_use]
    pub fn store(&self) -> &PackageStore {
        &self.store
    }

    #[must_use]
    pub fn shared_store(&self) -> &Arc<PackageStore> {
        &self.store
    }

    #[must_use]
    pub fn options(&self) -> CacheOptions {
        self.options
    }

    pub fn package_keys(&self) -> impl Iterator<Item = PackageKey> + '_ {
        self.store.package_keys()
    }

    #[must_use]
    pub fn state(&self, pk: PackageKey) -> &PackageState {
        &self.states[pk.index()]
    }

    pub(crate) fn restore(&mut self, pk: PackageKey, state: PackageState) {
        self.states[pk.index()] = state;
    }

    #[must_use]
    pub fn mode(&self, pk: PackageKey) -> Mode {
        self.state(pk).mode
    }

    #[must_use]
    pub fn candidate(&self, pk: PackageKey) -> Option<VersionKey> {
        self.state(pk).candidate
    }

    #[must_use]
    pub fn is_auto(&self, pk: PackageKey) -> bool {
        self.state(pk).auto_installed
    }

    #[must_use]
    pub fn is_protected(&self, pk: PackageKey) -> bool {
        self.state(pk).protected
    }

    #[must_use]
    pub fn current(&self, pk: PackageKey) -> Option<VersionKey> {
        self.store.current_version(pk)
    }

    #[must_use]
    pub fn is_installed(&self, pk: PackageKey) -> bool {
        self.current(pk).is_some()
    }

    /// Version the package will have after the transaction
    #[must_use]
    pub fn install_version(&self, pk: PackageKey) -> Option<VersionKey> {
        match self.mode(pk) {
            Mode::Install => self.candidate(pk),
            Mode::Delete => None,
            Mode::Keep => self.current(pk),
        }
    }

    fn version_in(&self, pk: PackageKey, which: Which) -> Option<VersionKey> {
        match which {
            Which::Now => self.current(pk),
            Which::Install => self.install_version(pk),
        }
    }

    fn compare_candidate(&self, pk: PackageKey) -> Option<std::cmp::Ordering> {
        let current = self.current(pk)?;
        let candidate = self.candidate(pk)?;
        Some(
            self.store
                .version(candidate)
                .version
                .cmp(&self.store.version(current).version),
        )
    }

    #[must_use]
    pub fn is_new_install(&self, pk: PackageKey) -> bool {
        self.mode(pk) == Mode::Install && self.current(pk).is_none() && self.candidate(pk).is_some()
    }

    #[must_use]
    pub fn is_upgrade(&self, pk: PackageKey) -> bool {
        self.mode(pk) == Mode::Install
            && self.compare_candidate(pk) == Some(std::cmp::Ordering::Greater)
    }

    #[must_use]
    pub fn is_downgrade(&self, pk: PackageKey) -> bool {
        self.mode(pk) == Mode::Install
            && self.compare_candidate(pk) == Some(std::cmp::Ordering::Less)
    }

    #[must_use]
    pub fn is_reinstall(&self, pk: PackageKey) -> bool {
        self.mode(pk) == Mode::Install
            && self.current(pk).is_some()
            && self.current(pk) == self.candidate(pk)
    }

    #[must_use]
    pub fn is_delete(&self, pk: PackageKey) -> bool {
        self.mode(pk) == Mode::Delete
    }

    /// Installed with a newer candidate, whatever the current mark
    #[must_use]
    pub fn is_upgradable(&self, pk: PackageKey) -> bool {
        self.compare_candidate(pk) == Some(std::cmp::Ordering::Greater)
    }

    #[must_use]
    pub fn inst_count(&self) -> usize {
        self.states.iter().filter(|s| s.mode == Mode::Install).count()
    }

    #[must_use]
    pub fn del_count(&self) -> usize {
        self.states.iter().filter(|s| s.mode == Mode::Delete).count()
    }

    /// Upgradable packages that stay at their installed version
    #[must_use]
    pub fn keep_count(&self) -> usize {
        self.package_keys()
            .filter(|&pk| self.mode(pk) == Mode::Keep && self.is_upgradable(pk))
            .count()
    }

    #[must_use]
    pub fn broken_count(&self) -> usize {
        self.package_keys().filter(|&pk| self.inst_broken(pk)).count()
    }

    /// Broken after the transaction
    #[must_use]
    pub fn inst_broken(&self, pk: PackageKey) -> bool {
        self.is_broken(pk, Which::Install)
    }

    /// Broken in the installed state
    #[must_use]
    pub fn now_broken(&self, pk: PackageKey) -> bool {
        self.is_broken(pk, Which::Now)
    }

    fn is_broken(&self, pk: PackageKey, which: Which) -> bool {
        let Some(vk) = self.version_in(pk, which) else {
            return false;
        };
        self.store
            .version(vk)
            .depends
            .iter()
            .any(|group| !self.group_holds(pk, group, which))
    }

    /// Whether a critical relation holds; other kinds always hold
    #[must_use]
    pub fn group_holds(&self, owner: PackageKey, group: &DepGroup, which: Which) -> bool {
        match group.kind {
            DepKind::Depends | DepKind::PreDepends => self.group_satisfied(group, which),
            DepKind::Conflicts | DepKind::Obsoletes => {
                self.conflicting(owner, group, which).is_empty()
            }
            DepKind::Recommends | DepKind::Provides => true,
        }
    }

    /// Whether any alternative of a positive group is met
    #[must_use]
    pub fn group_satisfied(&self, group: &DepGroup, which: Which) -> bool {
        group
            .alternatives
            .iter()
            .any(|atom| self.atom_satisfied(atom, which))
    }

    #[must_use]
    pub fn atom_satisfied(&self, atom: &DepAtom, which: Which) -> bool {
        if let Some(vk) = self.version_in(atom.target, which) {
            if constraint_matches(atom, &self.store.version(vk).version) {
                return true;
            }
        }
        self.store.providers(atom.target).iter().any(|p| {
            let owner = self.store.version(p.version).package;
            self.version_in(owner, which) == Some(p.version) && provider_matches(p, atom)
        })
    }

    /// Packages other than `owner` that violate a negative group
    #[must_use]
    pub fn conflicting(&self, owner: PackageKey, group: &DepGroup, which: Which) -> Vec<PackageKey> {
        let mut out = Vec::new();
        for atom in &group.alternatives {
            if atom.target != owner {
                if let Some(vk) = self.version_in(atom.target, which) {
                    if constraint_matches(atom, &self.store.version(vk).version) {
                        out.push(atom.target);
                    }
                }
            }
            for p in self.store.providers(atom.target) {
                let provider = self.store.version(p.version).package;
                if provider != owner
                    && self.version_in(provider, which) == Some(p.version)
                    && provider_matches(p, atom)
                    && !out.contains(&provider)
                {
                    out.push(provider);
                }
            }
        }
        out
    }

    /// First package whose candidate can satisfy `atom`, directly or
    /// through Provides
    #[must_use]
    pub fn installable(&self, atom: &DepAtom) -> Option<PackageKey> {
        let usable = |pk: PackageKey| {
            let state = self.state(pk);
            !(state.mode == Mode::Delete && (state.protected || state.remove_requested))
        };

        if let Some(cand) = self.candidate(atom.target) {
            if usable(atom.target) && constraint_matches(atom, &self.store.version(cand).version) {
                return Some(atom.target);
            }
        }
        self.store.providers(atom.target).iter().find_map(|p| {
            let owner = self.store.version(p.version).package;
            (self.candidate(owner) == Some(p.version) && provider_matches(p, atom) && usable(owner))
                .then_some(owner)
        })
    }

    /// Mark a package for installation of its candidate
    ///
    /// With `auto_inst`, unsatisfied Depends and PreDepends (and Recommends
    /// when enabled) are installed recursively and conflicting installed
    /// packages are marked for removal. Returns false when the package has
    /// no candidate or may not be changed.
    pub fn mark_install(&mut self, pk: PackageKey, auto_inst: bool, from_user: bool) -> bool {
        self.mark_install_at(pk, auto_inst, from_user, 0)
    }

    fn mark_install_at(
        &mut self,
        pk: PackageKey,
        auto_inst: bool,
        from_user: bool,
        depth: usize,
    ) -> bool {
        if depth > MAX_INSTALL_DEPTH {
            tracing::debug!(package = %self.store.package(pk).name, "install depth limit reached");
            return false;
        }

        let store = Arc::clone(&self.store);
        let pkg = store.package(pk);
        let current = pkg.current;
        let state = &self.states[pk.index()];
        let Some(cand) = state.candidate else {
            return false;
        };
        if !from_user && state.mode == Mode::Delete && (state.protected || state.remove_requested)
        {
            return false;
        }
        if !from_user && pkg.is_held() && current.is_some() && current != Some(cand) {
            return false;
        }

        let state = &mut self.states[pk.index()];
        if from_user {
            state.auto_installed = false;
        } else if current.is_none() && state.mode != Mode::Install {
            state.auto_installed = true;
        }

        let already = self.install_version(pk) == Some(cand);
        if already && !self.inst_broken(pk) {
            return true;
        }

        let state = &mut self.states[pk.index()];
        state.mode = if current == Some(cand) && !state.reinstall {
            Mode::Keep
        } else {
            Mode::Install
        };
        state.purge = false;

        if !auto_inst {
            return true;
        }

        for group in &store.version(cand).depends {
            let wanted = match group.kind {
                DepKind::Depends | DepKind::PreDepends => true,
                DepKind::Recommends => self.options.install_recommends,
                _ => false,
            };

            if wanted && !self.group_satisfied(group, Which::Install) {
                for atom in &group.alternatives {
                    let Some(target) = self.installable(atom) else {
                        continue;
                    };
                    if target != pk && self.mark_install_at(target, true, false, depth + 1) {
                        break;
                    }
                }
            }

            if group.kind.is_negative() {
                for other in self.conflicting(pk, group, Which::Install) {
                    if !self.is_protected(other) {
                        self.mark_delete(other, false);
                    }
                }
            }
        }
        true
    }

    /// Mark for removal; a package that is not installed reverts to Keep
    pub fn mark_delete(&mut self, pk: PackageKey, purge: bool) {
        let installed = self.is_installed(pk);
        let state = &mut self.states[pk.index()];
        state.reinstall = false;
        if installed {
            state.mode = Mode::Delete;
            state.purge = purge;
        } else {
            state.mode = Mode::Keep;
            state.purge = false;
        }
    }

    pub fn mark_keep(&mut self, pk: PackageKey) {
        let state = &mut self.states[pk.index()];
        state.mode = Mode::Keep;
        state.purge = false;
        state.reinstall = false;
    }

    pub fn mark_auto(&mut self, pk: PackageKey, auto: bool) {
        self.states[pk.index()].auto_installed = auto;
    }

    /// Make `vk` the candidate of its package
    pub fn set_candidate(&mut self, vk: VersionKey) {
        let pk = self.store.version(vk).package;
        self.states[pk.index()].candidate = Some(vk);
    }

    pub fn set_reinstall(&mut self, pk: PackageKey, reinstall: bool) {
        let has_candidate = self.candidate(pk).is_some();
        let state = &mut self.states[pk.index()];
        state.reinstall = reinstall;
        if reinstall && has_candidate {
            state.mode = Mode::Install;
        }
    }

    pub(crate) fn set_protected(&mut self, pk: PackageKey, protected: bool) {
        self.states[pk.index()].protected = protected;
    }

    pub(crate) fn set_remove_requested(&mut self, pk: PackageKey, remove: bool) {
        self.states[pk.index()].remove_requested = remove;
    }

    pub(crate) fn set_garbage(&mut self, pk: PackageKey, garbage: bool) {
        self.states[pk.index()].garbage = garbage;
    }
}

fn constraint_matches(atom: &DepAtom, version: &pkgjob_types::Version) -> bool {
    atom.constraint.as_ref().is_none_or(|c| c.matches(version))
}

// A versioned dependency is only met by a versioned Provides
fn provider_matches(provider: &Provider, atom: &DepAtom) -> bool {
    match (&atom.constraint, &provider.provided_version) {
        (None, _) => true,
        (Some(c), Some(v)) => c.matches(v),
        (Some(_), None) => false,
    }
}
