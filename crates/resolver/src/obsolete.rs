//! Obsoletion rule
//!
//! A removal is reported as obsoleting when some other package that is going
//! to be available replaces it through an `Obsoletes` relation.

use pkgjob_store::{PackageKey, PackageStore, INSTALLED_PRIORITY};
use pkgjob_types::DepKind;

use crate::depcache::DepCache;

/// Effective pin of a package's candidate
#[must_use]
pub fn pin_priority(store: &PackageStore, pk: PackageKey) -> i32 {
    let pkg = store.package(pk);
    if pkg.pin_priority != 0 {
        return pkg.pin_priority;
    }
    match pkg.candidate {
        Some(vk) => store.version(vk).origin_priority().unwrap_or(INSTALLED_PRIORITY),
        None => 0,
    }
}

/// Whether the installed package `pk` is obsoleted by another candidate
#[must_use]
pub fn is_obsoleted(cache: &DepCache, pk: PackageKey) -> bool {
    let store = cache.store();
    let Some(current) = store.current_version(pk) else {
        return false;
    };
    let current = &store.version(current).version;
    let pin = pin_priority(store, pk);

    store
        .reverse_depends(pk)
        .iter()
        .filter(|rev| rev.kind == DepKind::Obsoletes)
        .any(|rev| {
            let owner = store.version(rev.version).package;
            let Some(cand) = cache.candidate(owner) else {
                return false;
            };
            owner != pk
                && cand == rev.version
                && store.version(cand).is_downloadable()
                && rev.constraint.as_ref().is_none_or(|c| c.matches(current))
                && pin_priority(store, owner) >= pin
        })
}
