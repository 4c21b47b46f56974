//! Package-related type definitions

use pkgjob_errors::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dependency kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepKind {
    Depends,
    PreDepends,
    Recommends,
    Conflicts,
    Obsoletes,
    Provides,
}

impl DepKind {
    /// Name used in unmet-dependency reports
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Depends => "Depends",
            Self::PreDepends => "PreDepends",
            Self::Recommends => "Recommends",
            Self::Conflicts => "Conflicts",
            Self::Obsoletes => "Obsoletes",
            Self::Provides => "Provides",
        }
    }

    /// Control-file field carrying this relation
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::PreDepends => "Pre-Depends",
            other => other.as_str(),
        }
    }

    /// Relations that must hold for a package to be considered installable
    #[must_use]
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Self::Depends | Self::PreDepends | Self::Conflicts | Self::Obsoletes
        )
    }

    /// Relations satisfied by the absence of their target
    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(self, Self::Conflicts | Self::Obsoletes)
    }

    /// Relations that pull packages in
    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Depends | Self::PreDepends | Self::Recommends)
    }
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mark requested alongside an identifier through its data field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InstallIntent {
    /// `+auto:` prefix: install as a dependency
    Auto,
    /// `+manual:` prefix: install as explicitly requested
    Manual,
    #[default]
    Unspecified,
}

/// `name;version;arch;data` package identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentifier {
    pub name: String,
    pub version: String,
    pub arch: String,
    pub data: String,
}

impl PackageIdentifier {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        arch: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            arch: arch.into(),
            data: data.into(),
        }
    }

    /// Parse a full identifier
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentifier` unless the input has exactly
    /// four `;`-separated fields and a non-empty name.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let parts: Vec<&str> = s.split(';').collect();
        match parts.as_slice() {
            [name, version, arch, data] if !name.is_empty() => {
                Ok(Self::new(*name, *version, *arch, *data))
            }
            _ => Err(StoreError::InvalidIdentifier { id: s.to_string() }),
        }
    }

    /// True when `s` looks like a full identifier rather than a bare name
    #[must_use]
    pub fn is_identifier(s: &str) -> bool {
        s.matches(';').count() == 3
    }

    #[must_use]
    pub fn intent(&self) -> InstallIntent {
        if self.data.starts_with("+auto:") {
            InstallIntent::Auto
        } else if self.data.starts_with("+manual:") {
            InstallIntent::Manual
        } else {
            InstallIntent::Unspecified
        }
    }

    /// Data field with any intent prefix removed
    #[must_use]
    pub fn origin_data(&self) -> &str {
        self.data
            .strip_prefix("+auto:")
            .or_else(|| self.data.strip_prefix("+manual:"))
            .unwrap_or(&self.data)
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.origin_data().starts_with("installed")
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{};{}", self.name, self.version, self.arch, self.data)
    }
}

impl FromStr for PackageIdentifier {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Classification attached to an emitted package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoKind {
    Unknown,
    Installed,
    Available,
    Normal,
    Blocked,
    Installing,
    Removing,
    Updating,
    Downgrading,
    Obsoleting,
    Downloading,
    Finished,
}

/// What the client should restart after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartKind {
    None,
    Application,
    Session,
    System,
}

/// Maturity of the archive an update comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    Unknown,
    Stable,
    Testing,
    Unstable,
}

impl UpdateState {
    #[must_use]
    pub fn from_archive(archive: &str) -> Self {
        match archive {
            "stable" => Self::Stable,
            "testing" => Self::Testing,
            "unstable" | "experimental" => Self::Unstable,
            _ => Self::Unknown,
        }
    }
}

/// Job role, decides locking behaviour when the cache is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Query,
    Install,
    InstallFiles,
    Remove,
    Update,
    RepairSystem,
    RefreshCache,
}

impl Role {
    /// Roles that write to the system need the archive lock
    #[must_use]
    pub fn needs_lock(self) -> bool {
        matches!(
            self,
            Self::Install | Self::InstallFiles | Self::Remove | Self::Update
        )
    }

    #[must_use]
    pub fn allows_broken(self) -> bool {
        matches!(self, Self::RepairSystem)
    }
}

/// Installation state recorded by the package system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrentState {
    #[default]
    NotInstalled,
    ConfigFiles,
    HalfInstalled,
    Unpacked,
    HalfConfigured,
    TriggersAwaited,
    TriggersPending,
    Installed,
}

impl CurrentState {
    /// States left behind by an interrupted transaction
    #[must_use]
    pub fn is_unfinished(self) -> bool {
        matches!(
            self,
            Self::HalfInstalled | Self::Unpacked | Self::HalfConfigured
        )
    }
}

/// Selection requested by the administrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Selection {
    #[default]
    Unknown,
    Install,
    Hold,
    DeInstall,
    Purge,
}

/// Package priority field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    Required,
    Important,
    Standard,
    #[default]
    Optional,
    Extra,
}

impl Priority {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Self::Required,
            "important" => Self::Important,
            "standard" => Self::Standard,
            "extra" => Self::Extra,
            _ => Self::Optional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_roundtrip() {
        let id = PackageIdentifier::parse("bash;5.2-1;amd64;installed:debian-bookworm-main")
            .unwrap();
        assert_eq!(id.name, "bash");
        assert_eq!(id.version, "5.2-1");
        assert!(id.is_installed());
        assert_eq!(id.intent(), InstallIntent::Unspecified);
        assert_eq!(
            id.to_string(),
            "bash;5.2-1;amd64;installed:debian-bookworm-main"
        );
    }

    #[test]
    fn test_identifier_intent() {
        let id = PackageIdentifier::parse("vim;9.0;amd64;+auto:debian-bookworm-main").unwrap();
        assert_eq!(id.intent(), InstallIntent::Auto);
        assert_eq!(id.origin_data(), "debian-bookworm-main");

        let id = PackageIdentifier::parse("vim;9.0;amd64;+manual:").unwrap();
        assert_eq!(id.intent(), InstallIntent::Manual);
    }

    #[test]
    fn test_bare_names_are_not_identifiers() {
        assert!(!PackageIdentifier::is_identifier("bash"));
        assert!(PackageIdentifier::parse("bash").is_err());
        assert!(PackageIdentifier::parse(";1;amd64;").is_err());
    }

    #[test]
    fn test_update_state_mapping() {
        assert_eq!(UpdateState::from_archive("experimental"), UpdateState::Unstable);
        assert_eq!(UpdateState::from_archive("bookworm"), UpdateState::Unknown);
    }

    #[test]
    fn test_role_locking() {
        assert!(Role::Install.needs_lock());
        assert!(!Role::RepairSystem.needs_lock());
        assert!(Role::RepairSystem.allows_broken());
        assert!(!Role::Query.needs_lock());
    }
}
