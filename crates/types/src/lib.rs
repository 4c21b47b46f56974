#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the pkgjob transaction engine
//!
//! This crate provides fundamental types shared by every layer: Debian
//! version ordering, dependency kinds, package identifiers, filters and
//! the enums reported to clients.

pub mod filter;
pub mod group;
pub mod package;
pub mod version;

// Re-export commonly used types
pub use filter::{Filter, FilterSet};
pub use group::Group;
pub use package::{
    CurrentState, DepKind, InfoKind, InstallIntent, PackageIdentifier, Priority, RestartKind,
    Role, Selection, UpdateState,
};
pub use version::{Version, VersionConstraint, VersionOp};

/// Package names whose upgrade needs a reboot to take effect
#[must_use]
pub fn restart_required(name: &str) -> bool {
    name.starts_with("linux-image-")
        || name.starts_with("nvidia-")
        || matches!(name, "libc6" | "dbus" | "dbus-broker")
}
