#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package store for pkgjob
//!
//! This crate owns the package universe: an arena of packages and versions
//! addressed by integer keys, built from control records and never patched
//! in place. It also provides identifier lookups, archive naming and the
//! archive-directory lock.

mod archive;
mod builder;
pub mod control;
mod index;
mod lock;
mod model;
mod store;

pub use archive::{archive_file_name, archive_uri, quote_string};
pub use builder::{PackageRecord, StoreBuilder};
pub use index::{ControlIndex, ListSource, MemoryIndex, PackageIndex};
pub use lock::ArchiveLock;
pub use model::{
    DepAtom, DepGroup, Origin, Package, PackageKey, PackageVersion, Provider, RevDep, VersionKey,
    DEFAULT_ORIGIN_PRIORITY, DOWNGRADE_PRIORITY, INSTALLED_PRIORITY,
};
pub use store::{PackageStore, ResolvedPackage};

/// Repository origin with the default priority
#[must_use]
pub fn repo_origin(origin: &str, archive: &str, component: &str, uri: &str) -> Origin {
    let site = uri
        .split_once("://")
        .map_or(uri, |(_, rest)| rest)
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();
    Origin {
        origin: origin.to_string(),
        archive: archive.to_string(),
        component: component.to_string(),
        site,
        uri: Some(uri.to_string()),
        priority: DEFAULT_ORIGIN_PRIORITY,
    }
}
