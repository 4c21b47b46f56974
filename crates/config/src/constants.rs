//! Well-known system paths
//!
//! Defaults for the path section of the configuration. They match the
//! layout of a Debian-family system.

pub const ARCHIVE_DIR: &str = "/var/cache/apt/archives";

/// Lock file name inside the archive directory
pub const ARCHIVE_LOCK_NAME: &str = "lock";

/// Partial downloads live here until complete
pub const PARTIAL_DIR_NAME: &str = "partial";

/// Touched by maintainer scripts when a reboot is needed
pub const RESTART_MARKER: &str = "/var/run/reboot-required";

/// Present while a distribution upgrade owns the package system
pub const UPGRADE_LOCK: &str = "/var/lib/pkgjob/upgrade-lock";

pub const CONFIG_DIR_NAME: &str = "pkgjob";
pub const CONFIG_FILE_NAME: &str = "config.toml";
