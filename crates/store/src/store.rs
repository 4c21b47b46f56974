//! Read-only view over the loaded package universe

use std::collections::HashMap;

use pkgjob_types::{InstallIntent, PackageIdentifier};

use crate::model::{Package, PackageKey, PackageVersion, Provider, RevDep, VersionKey};

/// A version picked out of the store by identifier, with the mark the
/// caller asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub version: VersionKey,
    pub intent: InstallIntent,
}

impl From<VersionKey> for ResolvedPackage {
    fn from(version: VersionKey) -> Self {
        Self {
            version,
            intent: InstallIntent::Unspecified,
        }
    }
}

/// Immutable package universe
///
/// Built once by [`crate::StoreBuilder`] and shared behind an `Arc`. A cache
/// refresh replaces the whole store.
#[derive(Debug, Clone)]
pub struct PackageStore {
    native_arch: String,
    packages: Vec<Package>,
    versions: Vec<PackageVersion>,
    by_name: HashMap<String, Vec<PackageKey>>,
    providers: Vec<Vec<Provider>>,
    reverse: Vec<Vec<RevDep>>,
}

impl PackageStore {
    pub(crate) fn from_parts(
        native_arch: String,
        packages: Vec<Package>,
        versions: Vec<PackageVersion>,
        providers: Vec<Vec<Provider>>,
        reverse: Vec<Vec<RevDep>>,
    ) -> Self {
        let mut by_name: HashMap<String, Vec<PackageKey>> = HashMap::new();
        for (idx, pkg) in packages.iter().enumerate() {
            by_name
                .entry(pkg.name.clone())
                .or_default()
                .push(PackageKey(u32::try_from(idx).unwrap_or(u32::MAX)));
        }
        Self {
            native_arch,
            packages,
            versions,
            by_name,
            providers,
            reverse,
        }
    }

    #[must_use]
    pub fn native_arch(&self) -> &str {
        &self.native_arch
    }

    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn package_keys(&self) -> impl Iterator<Item = PackageKey> + '_ {
        (0..self.packages.len()).map(|i| PackageKey(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    pub fn packages(&self) -> impl Iterator<Item = (PackageKey, &Package)> {
        self.package_keys().zip(self.packages.iter())
    }

    #[must_use]
    pub fn package(&self, key: PackageKey) -> &Package {
        &self.packages[key.index()]
    }

    #[must_use]
    pub fn version(&self, key: VersionKey) -> &PackageVersion {
        &self.versions[key.index()]
    }

    /// Package owning a version
    #[must_use]
    pub fn owner(&self, key: VersionKey) -> &Package {
        self.package(self.version(key).package)
    }

    /// Find a package by name and architecture
    ///
    /// `all` and an empty architecture mean the native one.
    #[must_use]
    pub fn find_package(&self, name: &str, arch: &str) -> Option<PackageKey> {
        let arch = if arch.is_empty() || arch == "all" {
            self.native_arch.as_str()
        } else {
            arch
        };
        self.by_name
            .get(name)?
            .iter()
            .copied()
            .find(|&pk| self.package(pk).arch == arch)
    }

    /// Find a package by `name` or `name:arch`, preferring the native
    /// architecture
    #[must_use]
    pub fn find_by_name(&self, spec: &str) -> Option<PackageKey> {
        if let Some((name, arch)) = spec.split_once(':') {
            return self.find_package(name, arch);
        }
        let keys = self.by_name.get(spec)?;
        keys.iter()
            .copied()
            .find(|&pk| self.package(pk).arch == self.native_arch)
            .or_else(|| keys.first().copied())
    }

    #[must_use]
    pub fn current_version(&self, pk: PackageKey) -> Option<VersionKey> {
        self.package(pk).current
    }

    #[must_use]
    pub fn candidate_version(&self, pk: PackageKey) -> Option<VersionKey> {
        self.package(pk).candidate
    }

    /// Current version, else candidate, else the newest listed version
    #[must_use]
    pub fn find_version(&self, pk: PackageKey) -> Option<VersionKey> {
        let pkg = self.package(pk);
        pkg.current
            .or(pkg.candidate)
            .or_else(|| pkg.versions.first().copied())
    }

    #[must_use]
    pub fn is_installed(&self, pk: PackageKey) -> bool {
        self.package(pk).current.is_some()
    }

    /// Whether `vk` is the installed version of its package
    #[must_use]
    pub fn is_current(&self, vk: VersionKey) -> bool {
        self.owner(vk).current == Some(vk)
    }

    #[must_use]
    pub fn providers(&self, pk: PackageKey) -> &[Provider] {
        &self.providers[pk.index()]
    }

    /// Versions declaring a relation (other than Provides) on `pk`
    #[must_use]
    pub fn reverse_depends(&self, pk: PackageKey) -> &[RevDep] {
        &self.reverse[pk.index()]
    }

    #[must_use]
    pub fn is_virtual(&self, pk: PackageKey) -> bool {
        self.package(pk).versions.is_empty() && !self.providers(pk).is_empty()
    }

    /// A package that only exists because something names it
    #[must_use]
    pub fn is_empty_record(&self, pk: PackageKey) -> bool {
        self.package(pk).versions.is_empty() && self.providers(pk).is_empty()
    }

    /// Resolve a full identifier to a version
    ///
    /// Falls back to [`Self::find_version`] when the requested version string
    /// is not known.
    #[must_use]
    pub fn lookup_by_id(&self, id: &PackageIdentifier) -> Option<ResolvedPackage> {
        let pk = if id.arch.is_empty() {
            self.find_by_name(&id.name)?
        } else {
            self.find_package(&id.name, &id.arch)?
        };
        if self.is_empty_record(pk) {
            return None;
        }

        let intent = id.intent();
        let found = self.find_version(pk);
        if let Some(vk) = found {
            if self.version(vk).version.as_str() == id.version {
                return Some(ResolvedPackage { version: vk, intent });
            }
        }

        self.package(pk)
            .versions
            .iter()
            .copied()
            .find(|&vk| self.version(vk).version.as_str() == id.version)
            .or(found)
            .map(|version| ResolvedPackage { version, intent })
    }

    /// Resolve a mix of full identifiers and plain names
    ///
    /// Plain names yield the current version followed by the candidate.
    /// Unknown names are skipped.
    #[must_use]
    pub fn resolve_identifiers<S: AsRef<str>>(&self, ids: &[S]) -> Vec<ResolvedPackage> {
        let mut out = Vec::new();
        for raw in ids {
            let raw = raw.as_ref();
            if PackageIdentifier::is_identifier(raw) {
                match PackageIdentifier::parse(raw) {
                    Ok(id) => out.extend(self.lookup_by_id(&id)),
                    Err(err) => tracing::debug!(%err, "skipping malformed identifier"),
                }
                continue;
            }

            let Some(pk) = self.find_by_name(raw) else {
                continue;
            };
            if self.is_empty_record(pk) {
                continue;
            }
            out.extend(self.find_version(pk).map(ResolvedPackage::from));
            out.extend(self.candidate_version(pk).map(ResolvedPackage::from));
        }
        out
    }

    /// `name;version;arch;data` for a version
    #[must_use]
    pub fn build_identifier(&self, vk: VersionKey) -> PackageIdentifier {
        let ver = self.version(vk);
        let pkg = self.package(ver.package);
        let origin_id = ver
            .origins
            .first()
            .map_or_else(|| "local".to_string(), crate::Origin::id);
        let installed = pkg.current == Some(vk)
            && pkg.current_state == pkgjob_types::CurrentState::Installed;
        let data = if installed {
            format!("installed:{origin_id}")
        } else {
            origin_id
        };
        PackageIdentifier::new(&pkg.name, ver.version.as_str(), &ver.arch, data)
    }
}
