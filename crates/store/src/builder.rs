//! Interning of control records into a [`PackageStore`]
//!
//! Records from every source are merged by (name, arch, version), relation
//! names are resolved to package keys (creating placeholder packages for
//! targets nobody ships) and the candidate policy is applied once at the
//! end. A built store is never modified again.

use std::collections::HashMap;

use pkgjob_errors::{Error, StoreError};
use pkgjob_types::{DepKind, Priority, Version};

use crate::control::{parse_relations, parse_status, Paragraph, RelationAtom, StatusField};
use crate::model::{
    DepAtom, DepGroup, Origin, Package, PackageKey, PackageVersion, Provider, RevDep, VersionKey,
    DOWNGRADE_PRIORITY, INSTALLED_PRIORITY,
};
use crate::store::PackageStore;

const RELATION_FIELDS: [(&str, DepKind); 7] = [
    ("Depends", DepKind::Depends),
    ("Pre-Depends", DepKind::PreDepends),
    ("Recommends", DepKind::Recommends),
    ("Conflicts", DepKind::Conflicts),
    ("Breaks", DepKind::Conflicts),
    ("Obsoletes", DepKind::Obsoletes),
    ("Provides", DepKind::Provides),
];

/// A control record before interning
#[derive(Debug, Clone)]
pub struct PackageRecord {
    pub name: String,
    pub version: Version,
    pub arch: String,
    pub section: String,
    pub priority: Priority,
    pub essential: bool,
    pub important: bool,
    pub download_size: u64,
    pub installed_size: u64,
    pub relations: Vec<(DepKind, Vec<Vec<RelationAtom>>)>,
    pub origin: Origin,
    pub filename: Option<String>,
    pub hash: Option<String>,
    pub description: String,
    pub record: String,
    pub source: String,
    pub status: Option<StatusField>,
}

impl PackageRecord {
    /// Decode one paragraph of a package list or the status database
    ///
    /// # Errors
    ///
    /// Fails when `Package` or `Version` is missing, or when the version or
    /// a relationship field does not parse.
    pub fn from_paragraph(para: &Paragraph, origin: &Origin) -> Result<Self, Error> {
        let name = para.get("Package").ok_or_else(|| StoreError::OpenFailed {
            message: "record without a Package field".to_string(),
        })?;
        let version = para.get("Version").ok_or_else(|| StoreError::OpenFailed {
            message: format!("record for {name} without a Version field"),
        })?;
        let version = Version::parse(version)?;

        let mut relations = Vec::new();
        for (field, kind) in RELATION_FIELDS {
            if let Some(value) = para.get(field) {
                relations.push((kind, parse_relations(value)?));
            }
        }

        let yes = |field: &str| para.get(field).is_some_and(|v| v.eq_ignore_ascii_case("yes"));
        let size = |field: &str| para.get(field).and_then(|v| v.parse::<u64>().ok());

        Ok(Self {
            name: name.to_string(),
            version,
            arch: para.get("Architecture").unwrap_or("all").to_string(),
            section: para.get("Section").unwrap_or_default().to_string(),
            priority: para.get("Priority").map(Priority::parse).unwrap_or_default(),
            essential: yes("Essential"),
            important: yes("Important") || yes("Protected"),
            download_size: size("Size").unwrap_or(0),
            // Installed-Size is in KiB
            installed_size: size("Installed-Size").unwrap_or(0) * 1024,
            relations,
            origin: origin.clone(),
            filename: para.get("Filename").map(str::to_string),
            hash: para
                .get("SHA256")
                .or_else(|| para.get("MD5sum"))
                .map(str::to_string),
            description: para.get("Description").unwrap_or_default().to_string(),
            record: para.raw().to_string(),
            source: para
                .get("Source")
                .and_then(|s| s.split_whitespace().next())
                .unwrap_or(name)
                .to_string(),
            status: para.get("Status").and_then(parse_status),
        })
    }
}

/// Accumulates records and builds an immutable [`PackageStore`]
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    native_arch: String,
    records: Vec<PackageRecord>,
    auto_installed: Vec<(String, String)>,
    pins: HashMap<String, i32>,
}

impl StoreBuilder {
    #[must_use]
    pub fn new(native_arch: impl Into<String>) -> Self {
        Self {
            native_arch: native_arch.into(),
            records: Vec::new(),
            auto_installed: Vec::new(),
            pins: HashMap::new(),
        }
    }

    pub fn add(&mut self, record: PackageRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    /// Add every paragraph of a package list
    ///
    /// # Errors
    ///
    /// Returns the first record that fails to decode.
    pub fn add_list(&mut self, text: &str, origin: &Origin) -> Result<&mut Self, Error> {
        for para in crate::control::parse_paragraphs(text) {
            let record = PackageRecord::from_paragraph(&para, origin)?;
            self.records.push(record);
        }
        Ok(self)
    }

    /// Add the dpkg status database
    ///
    /// # Errors
    ///
    /// Returns the first record that fails to decode.
    pub fn add_status(&mut self, text: &str) -> Result<&mut Self, Error> {
        self.add_list(text, &Origin::local())
    }

    /// Apply an `extended_states` file
    pub fn add_extended_states(&mut self, text: &str) -> &mut Self {
        for para in crate::control::parse_paragraphs(text) {
            let auto = para.get("Auto-Installed").is_some_and(|v| v.trim() == "1");
            if let (Some(name), true) = (para.get("Package"), auto) {
                let arch = para.get("Architecture").unwrap_or(&self.native_arch);
                self.auto_installed
                    .push((name.to_string(), arch.to_string()));
            }
        }
        self
    }

    pub fn mark_auto(&mut self, name: &str) -> &mut Self {
        let arch = self.native_arch.clone();
        self.auto_installed.push((name.to_string(), arch));
        self
    }

    /// Per-package pin priority
    pub fn pin(&mut self, name: &str, priority: i32) -> &mut Self {
        self.pins.insert(name.to_string(), priority);
        self
    }

    #[must_use]
    pub fn build(&self) -> PackageStore {
        let mut interner = Interner::new(&self.native_arch);

        // Merge records describing the same version
        let mut merged: Vec<(PackageRecord, Vec<Origin>)> = Vec::new();
        let mut seen: HashMap<(String, String, String), usize> = HashMap::new();
        for record in &self.records {
            let key = (
                record.name.clone(),
                interner.package_arch(&record.arch),
                record.version.as_str().to_string(),
            );
            match seen.get(&key) {
                Some(&idx) => merge_into(&mut merged[idx], record),
                None => {
                    seen.insert(key, merged.len());
                    merged.push((record.clone(), vec![record.origin.clone()]));
                }
            }
        }

        for (record, _) in &merged {
            let pk = interner.package(&record.name, &record.arch);
            let pkg = &mut interner.packages[pk.index()];
            pkg.essential |= record.essential;
            pkg.important |= record.important;
        }

        for (record, mut origins) in merged {
            let pk = interner.package(&record.name, &record.arch);
            let vk = VersionKey(index_u32(interner.versions.len()));

            let mut depends = Vec::new();
            for (kind, groups) in &record.relations {
                for group in groups {
                    let alternatives = group
                        .iter()
                        .map(|atom| DepAtom {
                            target: interner.relation_target(atom, &record.arch),
                            constraint: atom.constraint.clone(),
                        })
                        .collect();
                    depends.push(DepGroup {
                        kind: *kind,
                        alternatives,
                    });
                }
            }

            origins.sort_by_key(|o| !o.is_downloadable());

            if let Some(status) = record.status {
                let pkg = &mut interner.packages[pk.index()];
                pkg.selection = status.selection;
                pkg.current_state = status.state;
                pkg.reinstall_required = status.reinstall_required;
                if status.has_current_version() {
                    pkg.current = Some(vk);
                }
            }

            let summary = record
                .description
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();

            interner.versions.push(PackageVersion {
                package: pk,
                version: record.version,
                arch: record.arch,
                section: record.section,
                priority: record.priority,
                download_size: record.download_size,
                installed_size: record.installed_size,
                depends,
                origins,
                filename: record.filename,
                hash: record.hash,
                summary,
                description: record.description,
                record: record.record,
                source: record.source,
            });
            interner.packages[pk.index()].versions.push(vk);
        }

        for (name, arch) in &self.auto_installed {
            if let Some(&pk) = interner.index.get(&(name.clone(), interner.package_arch(arch))) {
                interner.packages[pk.index()].auto_installed = true;
            }
        }
        for (name, priority) in &self.pins {
            for pkg in interner.packages.iter_mut().filter(|p| &p.name == name) {
                pkg.pin_priority = *priority;
            }
        }

        interner.finish()
    }
}

fn merge_into(existing: &mut (PackageRecord, Vec<Origin>), other: &PackageRecord) {
    let (record, origins) = existing;
    if !origins.contains(&other.origin) {
        origins.push(other.origin.clone());
    }

    let status = other.status.or(record.status);
    if other.origin.is_downloadable() && !record.origin.is_downloadable() {
        // Repository metadata is richer than the status database copy
        *record = other.clone();
    }
    record.status = status;
}

fn index_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

struct Interner {
    native_arch: String,
    packages: Vec<Package>,
    versions: Vec<PackageVersion>,
    index: HashMap<(String, String), PackageKey>,
}

impl Interner {
    fn new(native_arch: &str) -> Self {
        Self {
            native_arch: native_arch.to_string(),
            packages: Vec::new(),
            versions: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Architecture-independent records live in the native package
    fn package_arch(&self, arch: &str) -> String {
        if arch == "all" || arch.is_empty() {
            self.native_arch.clone()
        } else {
            arch.to_string()
        }
    }

    fn package(&mut self, name: &str, arch: &str) -> PackageKey {
        let arch = self.package_arch(arch);
        let key = (name.to_string(), arch);
        if let Some(&pk) = self.index.get(&key) {
            return pk;
        }
        let pk = PackageKey(index_u32(self.packages.len()));
        self.packages.push(Package::placeholder(&key.0, &key.1));
        self.index.insert(key, pk);
        pk
    }

    fn relation_target(&mut self, atom: &RelationAtom, declaring_arch: &str) -> PackageKey {
        let arch = atom.arch.as_deref().unwrap_or(declaring_arch).to_string();
        self.package(&atom.name, &arch)
    }

    fn finish(mut self) -> PackageStore {
        let count = self.packages.len();
        let mut providers: Vec<Vec<Provider>> = vec![Vec::new(); count];
        let mut reverse: Vec<Vec<RevDep>> = vec![Vec::new(); count];

        for (idx, ver) in self.versions.iter().enumerate() {
            let vk = VersionKey(index_u32(idx));
            for group in &ver.depends {
                for atom in &group.alternatives {
                    if group.kind == DepKind::Provides {
                        providers[atom.target.index()].push(Provider {
                            version: vk,
                            provided_version: atom
                                .constraint
                                .as_ref()
                                .map(|c| c.version.clone()),
                        });
                    } else {
                        reverse[atom.target.index()].push(RevDep {
                            version: vk,
                            kind: group.kind,
                            constraint: atom.constraint.clone(),
                        });
                    }
                }
            }
        }

        let versions = &self.versions;
        for pkg in &mut self.packages {
            pkg.versions
                .sort_by(|a, b| versions[b.index()].version.cmp(&versions[a.index()].version));
            pkg.candidate = select_candidate(pkg, versions);
        }

        PackageStore::from_parts(
            self.native_arch,
            self.packages,
            self.versions,
            providers,
            reverse,
        )
    }
}

/// Candidate policy: highest priority wins, ties go to the newer version.
/// A version older than the installed one needs a downgrade-level priority.
fn select_candidate(pkg: &Package, versions: &[PackageVersion]) -> Option<VersionKey> {
    let current = pkg.current.map(|vk| &versions[vk.index()].version);
    let mut best: Option<(i32, VersionKey)> = None;

    for &vk in &pkg.versions {
        let ver = &versions[vk.index()];
        let origin = ver.origin_priority().map(|p| {
            if pkg.pin_priority != 0 {
                pkg.pin_priority
            } else {
                p
            }
        });
        let priority = match (origin, pkg.current == Some(vk)) {
            (Some(p), true) => p.max(INSTALLED_PRIORITY),
            (Some(p), false) => p,
            (None, true) => INSTALLED_PRIORITY,
            (None, false) => continue,
        };

        if let Some(current) = current {
            if ver.version < *current && priority < DOWNGRADE_PRIORITY {
                continue;
            }
        }

        // Versions are visited newest first, so only a strictly higher
        // priority displaces the current best
        if best.is_none_or(|(p, _)| priority > p) {
            best = Some((priority, vk));
        }
    }

    best.map(|(_, vk)| vk)
}
