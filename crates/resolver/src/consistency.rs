//! Whole-cache repair helpers used when opening the cache and planning
//! upgrades

use pkgjob_errors::Error;
use pkgjob_store::PackageKey;

use crate::depcache::DepCache;
use crate::problem::ProblemResolver;

impl DepCache {
    /// Queue reinstallation of packages left unfinished by an interrupted
    /// transaction
    ///
    /// Packages whose installed version can no longer be downloaded are
    /// marked for removal instead.
    pub fn apply_status(&mut self) {
        let unfinished: Vec<PackageKey> = self
            .store()
            .packages()
            .filter(|(_, pkg)| {
                pkg.current.is_some()
                    && (pkg.current_state.is_unfinished() || pkg.reinstall_required)
            })
            .map(|(pk, _)| pk)
            .collect();

        for pk in unfinished {
            let Some(current) = self.current(pk) else {
                continue;
            };
            if self.store().version(current).is_downloadable() {
                self.set_candidate(current);
                self.set_reinstall(pk, true);
                self.mark_install(pk, true, false);
            } else {
                tracing::warn!(
                    package = %self.store().package(pk).name,
                    "unfinished package cannot be downloaded again, removing"
                );
                self.mark_delete(pk, false);
            }
        }
    }

    /// Mark every broken package for installation and let the problem
    /// resolver settle the rest
    pub fn fix_broken(&mut self) -> Result<(), Error> {
        let broken: Vec<PackageKey> = self
            .package_keys()
            .filter(|&pk| self.inst_broken(pk))
            .collect();
        for pk in broken {
            self.mark_install(pk, true, false);
        }
        ProblemResolver::new(self).resolve(true)
    }

    /// Hold back upgrades one by one wherever doing so keeps the cache
    /// consistent
    pub fn minimize_upgrade(&mut self) {
        let upgrades: Vec<PackageKey> = self
            .package_keys()
            .filter(|&pk| self.is_upgrade(pk))
            .collect();
        for pk in upgrades {
            let before = self.state(pk).clone();
            self.mark_keep(pk);
            if self.broken_count() > 0 {
                self.restore(pk, before);
            }
        }
    }

    /// Mark every installed package that is not held for upgrade
    pub fn dist_upgrade(&mut self) -> Result<(), Error> {
        let installed: Vec<PackageKey> = self
            .store()
            .packages()
            .filter(|(_, pkg)| pkg.current.is_some() && !pkg.is_held())
            .map(|(pk, _)| pk)
            .collect();
        for pk in installed {
            self.mark_install(pk, true, false);
        }
        ProblemResolver::new(self).resolve(false)
    }
}
