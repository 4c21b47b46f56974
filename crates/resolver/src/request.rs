//! Marking a user request onto the cache

use pkgjob_errors::{Error, ResolverError};
use pkgjob_events::PhaseProgress;
use pkgjob_platform::CancelToken;
use pkgjob_store::ResolvedPackage;
use pkgjob_types::InstallIntent;

use crate::depcache::DepCache;
use crate::problem::ProblemResolver;
use crate::report::install_report;

const FIX_BROKEN_FAILED: &str = "Unable to resolve broken packages. Please attempt to resolve \
                                 this manually, or try `sudo apt -f install`.";

/// Packages to install, upgrade and remove in one transaction
#[derive(Debug, Clone, Default)]
pub struct TransactionRequest {
    pub install: Vec<ResolvedPackage>,
    pub update: Vec<ResolvedPackage>,
    pub remove: Vec<ResolvedPackage>,
    pub fix_broken: bool,
    pub autoremove: bool,
}

impl TransactionRequest {
    #[must_use]
    pub fn install(packages: Vec<ResolvedPackage>) -> Self {
        Self {
            install: packages,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn update(packages: Vec<ResolvedPackage>) -> Self {
        Self {
            update: packages,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn remove(packages: Vec<ResolvedPackage>, autoremove: bool) -> Self {
        Self {
            remove: packages,
            autoremove,
            ..Self::default()
        }
    }

    /// Repair broken dependencies without any package request
    #[must_use]
    pub fn repair() -> Self {
        Self {
            fix_broken: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.install.len() + self.update.len() + self.remove.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Group {
    Install,
    Update,
}

/// Mark the request onto `cache` and resolve it
///
/// On success the cache is consistent and ready to be executed. Cancellation
/// stops the marking loops early and resolution proceeds with what was
/// marked so far.
pub fn apply_request(
    cache: &mut DepCache,
    request: &TransactionRequest,
    cancel: &CancelToken,
    progress: &mut PhaseProgress,
) -> Result<(), Error> {
    let attempt_fix = cache.broken_count() > 0;
    if attempt_fix {
        tracing::info!(
            broken = cache.broken_count(),
            "cache has broken packages, attempting to fix"
        );
    }

    if request.fix_broken && attempt_fix && cache.fix_broken().is_err() {
        return Err(Error::internal(FIX_BROKEN_FAILED));
    }

    let baseline = request.autoremove.then(|| cache.garbage());

    let total = request.total();
    let mut processed = 0usize;

    for (packages, group) in [
        (&request.install, Group::Install),
        (&request.update, Group::Update),
    ] {
        for auto_inst in [false, true] {
            for resolved in packages {
                if cancel.is_cancelled() {
                    break;
                }
                if attempt_fix && cache.broken_count() > 0 && cache.fix_broken().is_err() {
                    return Err(Error::internal(FIX_BROKEN_FAILED));
                }

                // A version that is neither installed nor fetchable cannot
                // become a candidate
                let store = cache.store();
                let pk = store.version(resolved.version).package;
                if !store.version(resolved.version).is_downloadable()
                    && !store.is_current(resolved.version)
                {
                    return Err(ResolverError::NoCandidate {
                        package: cache.store().package(pk).name.clone(),
                    }
                    .into());
                }
                cache.set_candidate(resolved.version);

                let from_user = match (resolved.intent, group) {
                    (InstallIntent::Auto, _) => false,
                    (InstallIntent::Manual, _) | (InstallIntent::Unspecified, Group::Install) => {
                        true
                    }
                    (InstallIntent::Unspecified, Group::Update) => !cache.is_auto(pk),
                };
                cache.mark_install(pk, auto_inst, from_user);

                let mut fixer = ProblemResolver::new(cache);
                fixer.clear(pk);
                fixer.protect(pk);

                if auto_inst {
                    processed += 1;
                    progress.set_ratio(processed, total);
                }
            }
        }
    }

    for resolved in &request.remove {
        if cancel.is_cancelled() {
            break;
        }
        let pk = cache.store().version(resolved.version).package;
        let mut fixer = ProblemResolver::new(cache);
        fixer.clear(pk);
        fixer.protect(pk);
        fixer.remove(pk);
        if cache.is_installed(pk) {
            cache.mark_delete(pk, false);
        }
        processed += 1;
        progress.set_ratio(processed, total);
    }

    if let Err(e) = ProblemResolver::new(cache).resolve(true) {
        tracing::debug!(error = %e, "problem resolver left packages broken");
    }

    if cache.broken_count() > 0 {
        let report = install_report(cache);
        tracing::warn!("{report}");
        return Err(ResolverError::DepResolutionFailed { message: report }.into());
    }

    if let Some(baseline) = baseline {
        let garbage = cache.garbage();
        for pk in garbage.difference(&baseline) {
            if cache.is_installed(pk) {
                tracing::debug!(package = %cache.store().package(pk).name, "autoremoving");
                cache.mark_delete(pk, false);
            }
        }
    }

    tracing::debug!(
        install = cache.inst_count(),
        remove = cache.del_count(),
        keep = cache.keep_count(),
        "request applied"
    );
    Ok(())
}
