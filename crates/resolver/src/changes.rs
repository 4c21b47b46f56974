//! Change-set classification
//!
//! One read-only walk over the cache sorts every marked package into the
//! buckets reported to clients.

use pkgjob_store::{PackageKey, VersionKey};
use pkgjob_types::{restart_required, InfoKind};

use crate::depcache::DepCache;
use crate::obsolete::is_obsoleted;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub installing: Vec<VersionKey>,
    pub removing: Vec<VersionKey>,
    pub obsoleting: Vec<VersionKey>,
    pub updating: Vec<VersionKey>,
    pub downgrading: Vec<VersionKey>,
    /// Changed versions whose package needs a reboot to take effect
    pub restart: Vec<VersionKey>,
}

impl ChangeSet {
    #[must_use]
    pub fn classify(cache: &DepCache) -> Self {
        let store = cache.store();
        let mut set = Self::default();

        for pk in cache.package_keys() {
            let Some((bucket, vk)) = set.bucket_for(cache, pk) else {
                continue;
            };
            bucket.push(vk);
            if restart_required(&store.package(pk).name) {
                set.restart.push(vk);
            }
        }
        set
    }

    fn bucket_for(&mut self, cache: &DepCache, pk: PackageKey) -> Option<(&mut Vec<VersionKey>, VersionKey)> {
        if cache.is_new_install(pk) {
            Some((&mut self.installing, cache.candidate(pk)?))
        } else if cache.is_delete(pk) {
            let vk = cache.store().find_version(pk)?;
            if is_obsoleted(cache, pk) {
                Some((&mut self.obsoleting, vk))
            } else {
                Some((&mut self.removing, vk))
            }
        } else if cache.is_upgrade(pk) {
            Some((&mut self.updating, cache.candidate(pk)?))
        } else if cache.is_downgrade(pk) {
            Some((&mut self.downgrading, cache.candidate(pk)?))
        } else {
            None
        }
    }

    /// Buckets in the order they are reported
    #[must_use]
    pub fn ordered(&self) -> [(InfoKind, &[VersionKey]); 5] {
        [
            (InfoKind::Obsoleting, &self.obsoleting),
            (InfoKind::Removing, &self.removing),
            (InfoKind::Downgrading, &self.downgrading),
            (InfoKind::Installing, &self.installing),
            (InfoKind::Updating, &self.updating),
        ]
    }

    /// Every changed version, in reporting order
    pub fn all(&self) -> impl Iterator<Item = VersionKey> + '_ {
        self.ordered()
            .into_iter()
            .flat_map(|(_, versions)| versions.iter().copied())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered().iter().all(|(_, v)| v.is_empty())
    }
}
