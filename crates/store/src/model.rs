//! Arena records for packages and versions
//!
//! Packages and versions live in flat vectors owned by the store and refer
//! to each other through integer keys. Dependency edges carry the target
//! package key, never a reference.

use pkgjob_types::{CurrentState, DepKind, Priority, Selection, Version, VersionConstraint};
use serde::{Deserialize, Serialize};

/// Default priority of a repository origin
pub const DEFAULT_ORIGIN_PRIORITY: i32 = 500;

/// Priority given to the installed version by the candidate policy
pub const INSTALLED_PRIORITY: i32 = 100;

/// Origins at or above this priority may downgrade an installed package
pub const DOWNGRADE_PRIORITY: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageKey(pub(crate) u32);

impl PackageKey {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Key for an arena slot; lookups panic if the slot does not exist
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionKey(pub(crate) u32);

impl VersionKey {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Key for an arena slot; lookups panic if the slot does not exist
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }
}

/// One alternative of a dependency group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepAtom {
    pub target: PackageKey,
    pub constraint: Option<VersionConstraint>,
}

/// OR-list of alternatives for one relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepGroup {
    pub kind: DepKind,
    pub alternatives: Vec<DepAtom>,
}

/// Where a version can be obtained from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Free-form origin, e.g. `Debian`
    pub origin: String,
    /// Suite, e.g. `stable` or `jammy-updates`
    pub archive: String,
    pub component: String,
    /// Host name the archive is served from
    pub site: String,
    /// Base URI; origins without one are not downloadable
    pub uri: Option<String>,
    pub priority: i32,
}

impl Origin {
    /// Origin of entries that only exist in the local status database
    #[must_use]
    pub fn local() -> Self {
        Self {
            origin: String::new(),
            archive: String::new(),
            component: String::new(),
            site: String::new(),
            uri: None,
            priority: INSTALLED_PRIORITY,
        }
    }

    #[must_use]
    pub fn is_downloadable(&self) -> bool {
        self.uri.is_some()
    }

    /// `origin-suite-component` as used in the data field of identifiers
    #[must_use]
    pub fn id(&self) -> String {
        if self.origin.is_empty() || self.archive.is_empty() {
            return "local".to_string();
        }
        if self.component.is_empty() {
            return "invalid".to_string();
        }
        format!(
            "{}-{}-{}",
            sanitize(&self.origin),
            sanitize(&self.archive),
            sanitize(&self.component)
        )
    }
}

// Lowercase, and collapse runs of space, control and punctuation into `_`
fn sanitize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut in_run = false;
    for c in part.chars() {
        if c.is_whitespace() || c.is_control() || c.is_ascii_punctuation() {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.extend(c.to_lowercase());
            in_run = false;
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub arch: String,
    /// Newest first
    pub versions: Vec<VersionKey>,
    pub current: Option<VersionKey>,
    pub candidate: Option<VersionKey>,
    pub essential: bool,
    pub important: bool,
    pub selection: Selection,
    pub current_state: CurrentState,
    pub reinstall_required: bool,
    pub auto_installed: bool,
    pub pin_priority: i32,
}

impl Package {
    pub(crate) fn placeholder(name: &str, arch: &str) -> Self {
        Self {
            name: name.to_string(),
            arch: arch.to_string(),
            versions: Vec::new(),
            current: None,
            candidate: None,
            essential: false,
            important: false,
            selection: Selection::Unknown,
            current_state: CurrentState::NotInstalled,
            reinstall_required: false,
            auto_installed: false,
            pin_priority: 0,
        }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.selection == Selection::Hold
    }

    /// Essential or important packages may not be removed by a transaction
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.essential || self.important
    }
}

#[derive(Debug, Clone)]
pub struct PackageVersion {
    pub package: PackageKey,
    pub version: Version,
    pub arch: String,
    /// Raw section, possibly prefixed by `component/`
    pub section: String,
    pub priority: Priority,
    pub download_size: u64,
    pub installed_size: u64,
    pub depends: Vec<DepGroup>,
    /// Downloadable origins first
    pub origins: Vec<Origin>,
    pub filename: Option<String>,
    pub hash: Option<String>,
    pub summary: String,
    /// Full Description field, summary line included
    pub description: String,
    /// Raw control record
    pub record: String,
    pub source: String,
}

impl PackageVersion {
    #[must_use]
    pub fn is_downloadable(&self) -> bool {
        self.origins.iter().any(Origin::is_downloadable)
    }

    #[must_use]
    pub fn download_origin(&self) -> Option<&Origin> {
        self.origins.iter().find(|o| o.is_downloadable())
    }

    /// Section without its component prefix
    #[must_use]
    pub fn section_name(&self) -> &str {
        self.section
            .rsplit_once('/')
            .map_or(self.section.as_str(), |(_, s)| s)
    }

    /// Component the section belongs to, `main` when unqualified
    #[must_use]
    pub fn component(&self) -> &str {
        self.section.split_once('/').map_or("main", |(c, _)| c)
    }

    pub fn groups(&self, kind: DepKind) -> impl Iterator<Item = &DepGroup> {
        self.depends.iter().filter(move |g| g.kind == kind)
    }

    /// Best priority among downloadable origins
    #[must_use]
    pub fn origin_priority(&self) -> Option<i32> {
        self.origins
            .iter()
            .filter(|o| o.is_downloadable())
            .map(|o| o.priority)
            .max()
    }
}

/// A version providing a (usually virtual) package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub version: VersionKey,
    /// Version given by a versioned `Provides: name (= v)`
    pub provided_version: Option<Version>,
}

/// Edge from a declaring version to the package it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevDep {
    pub version: VersionKey,
    pub kind: DepKind,
    pub constraint: Option<VersionConstraint>,
}
