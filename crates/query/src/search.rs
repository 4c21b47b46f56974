//! Name, description, group and repository lookups

use pkgjob_errors::{Error, QueryError};
use pkgjob_store::{PackageKey, VersionKey};
use pkgjob_types::Group;

use crate::filter::is_installed_version;
use crate::Query;

impl Query<'_> {
    /// Packages whose name contains any of `needles`, ignoring case
    #[must_use]
    pub fn search_names<S: AsRef<str>>(&self, needles: &[S]) -> Vec<VersionKey> {
        self.search(needles, false)
    }

    /// Like [`Self::search_names`], also matching the long description
    #[must_use]
    pub fn search_details<S: AsRef<str>>(&self, needles: &[S]) -> Vec<VersionKey> {
        self.search(needles, true)
    }

    fn search<S: AsRef<str>>(&self, needles: &[S], details: bool) -> Vec<VersionKey> {
        let needles: Vec<String> = needles.iter().map(|n| n.as_ref().to_lowercase()).collect();
        let store = self.store;
        let mut out = Vec::new();

        for (pk, pkg) in store.packages() {
            if self.cancelled() {
                break;
            }
            if store.is_empty_record(pk) {
                continue;
            }

            let name = pkg.name.to_lowercase();
            let mut hit = needles.iter().any(|n| name.contains(n.as_str()));
            if !hit && details {
                if let Some(vk) = store.find_version(pk) {
                    let description = store.version(vk).description.to_lowercase();
                    hit = needles.iter().any(|n| description.contains(n.as_str()));
                }
            }
            if !hit {
                continue;
            }

            if store.is_virtual(pk) {
                out.extend(self.provider_owners(pk));
            } else {
                out.extend(store.find_version(pk));
            }
        }
        out
    }

    /// Versions of the real packages providing virtual `pk`
    fn provider_owners(&self, pk: PackageKey) -> Vec<VersionKey> {
        let store = self.store;
        store
            .providers(pk)
            .iter()
            .filter_map(|p| store.find_version(store.version(p.version).package))
            .collect()
    }

    /// Every package that has a version
    #[must_use]
    pub fn get_packages(&self) -> Vec<VersionKey> {
        let mut out = Vec::new();
        for pk in self.store.package_keys() {
            if self.cancelled() {
                break;
            }
            if self.store.package(pk).versions.is_empty() {
                continue;
            }
            out.extend(self.store.find_version(pk));
        }
        out
    }

    /// Packages whose section falls into one of `groups`
    ///
    /// # Errors
    ///
    /// Returns `QueryError::EmptyGroup` when any requested group is empty.
    pub fn get_packages_from_group<S: AsRef<str>>(&self, groups: &[S]) -> Result<Vec<VersionKey>, Error> {
        let mut wanted = Vec::with_capacity(groups.len());
        for group in groups {
            let group = group.as_ref();
            if group.is_empty() {
                return Err(QueryError::EmptyGroup.into());
            }
            match Group::parse(group) {
                Some(parsed) => wanted.push(parsed),
                None => tracing::debug!(group, "ignoring unknown group"),
            }
        }

        let store = self.store;
        let mut out = Vec::new();
        for (pk, pkg) in store.packages() {
            if self.cancelled() {
                break;
            }
            let Some(&first) = pkg.versions.first() else {
                continue;
            };
            let group = Group::from_section(&store.version(first).section);
            if wanted.contains(&group) {
                out.extend(store.find_version(pk));
            }
        }
        Ok(out)
    }

    /// Installed versions that came from the repository `uri dist sections`
    #[must_use]
    pub fn get_packages_from_repo<S: AsRef<str>>(&self, dist: &str, sections: &[S], uri: &str) -> Vec<VersionKey> {
        let store = self.store;
        let mut out = Vec::new();
        for pk in store.package_keys() {
            if self.cancelled() {
                break;
            }
            let Some(vk) = store.current_version(pk) else {
                continue;
            };
            if !is_installed_version(store, vk) {
                continue;
            }
            let from_repo = store.version(vk).origins.iter().any(|origin| {
                origin.archive == dist
                    && sections.iter().any(|s| s.as_ref() == origin.component)
                    && !origin.site.is_empty()
                    && uri.contains(&origin.site)
            });
            if from_repo {
                out.push(vk);
            }
        }
        out
    }
}
