//! Refuse transactions that take a system package away

use pkgjob_errors::{Error, ResolverError};
use pkgjob_types::DepKind;

use crate::depcache::{DepCache, Mode};
use crate::obsolete::is_obsoleted;

/// Fail when an essential or important package would be removed
///
/// Removals covered by an obsoleting replacement are allowed.
pub fn check_essential(cache: &DepCache) -> Result<(), Error> {
    let store = cache.store();
    let mut entries: Vec<String> = Vec::new();
    let mut push = |entry: String| {
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    };

    for (pk, pkg) in store.packages() {
        if pkg.is_system() && cache.mode(pk) == Mode::Delete && !is_obsoleted(cache, pk) {
            push(pkg.name.clone());
        }
    }

    for (pk, pkg) in store.packages() {
        let Some(current) = pkg.current.filter(|_| pkg.is_system()) else {
            continue;
        };
        let groups = store
            .version(current)
            .depends
            .iter()
            .filter(|g| matches!(g.kind, DepKind::Depends | DepKind::PreDepends));
        for atom in groups.flat_map(|g| &g.alternatives) {
            if atom.target != pk
                && cache.mode(atom.target) == Mode::Delete
                && !is_obsoleted(cache, atom.target)
            {
                push(format!(
                    "{} (due to {})",
                    store.package(atom.target).name,
                    pkg.name
                ));
            }
        }
    }

    if entries.is_empty() {
        return Ok(());
    }
    tracing::warn!(packages = %entries.join(" "), "refusing to remove system packages");
    Err(ResolverError::CannotRemoveSystemPackage {
        packages: entries.join(" "),
    }
    .into())
}
