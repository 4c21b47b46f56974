//! Debian version ordering and relation constraints
//!
//! Versions follow the dpkg scheme `[epoch:]upstream[-revision]`:
//! - the epoch compares numerically and defaults to 0
//! - upstream and revision compare with alternating non-digit and digit runs
//! - letters sort before non-letters, and `~` sorts before everything,
//!   including the end of the string (`1.0~rc1 < 1.0`)
//!
//! Relations use the control-file operators `<<`, `<=`, `=`, `>=`, `>>`.
//! The obsolete single `<` and `>` are accepted as `<=` and `>=`.

use pkgjob_errors::VersionError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed Debian package version
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    epoch: u32,
    upstream: String,
    revision: String,
}

impl Version {
    /// Parse a version string
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidVersion` if the string is empty, contains
    /// whitespace, has a non-numeric epoch, or an empty upstream part.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let raw = input.trim();
        let invalid = || VersionError::InvalidVersion {
            input: input.to_string(),
        };

        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (epoch, rest) = match raw.split_once(':') {
            Some((epoch, rest)) => (epoch.parse::<u32>().map_err(|_| invalid())?, rest),
            None => (0, raw),
        };

        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((upstream, revision)) => (upstream, revision),
            None => (rest, ""),
        };

        if upstream.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            raw: raw.to_string(),
            epoch,
            upstream: upstream.to_string(),
            revision: revision.to_string(),
        })
    }

    /// The version exactly as written in the index
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    #[must_use]
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    #[must_use]
    pub fn revision(&self) -> &str {
        &self.revision
    }
}

fn char_order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(b'~') => -1,
        Some(c) => i32::from(c) + 256,
    }
}

/// dpkg's `verrevcmp` over one version fragment
fn compare_fragment(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit()) {
            let ac = char_order(a.get(i).copied());
            let bc = char_order(b.get(j).copied());
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        while i < a.len() && a[i] == b'0' {
            i += 1;
        }
        while j < b.len() && b[j] == b'0' {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while i < a.len() && a[i].is_ascii_digit() && j < b.len() && b[j].is_ascii_digit() {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }

        if i < a.len() && a[i].is_ascii_digit() {
            return Ordering::Greater;
        }
        if j < b.len() && b[j].is_ascii_digit() {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }

    Ordering::Equal
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_fragment(&self.upstream, &other.upstream))
            .then_with(|| compare_fragment(&self.revision, &other.revision))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Relation operator of a versioned dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionOp {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
    NotEqual,
}

impl VersionOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Less => "<<",
            Self::LessEqual => "<=",
            Self::Equal => "=",
            Self::GreaterEqual => ">=",
            Self::Greater => ">>",
            Self::NotEqual => "!=",
        }
    }

    /// Split a leading operator off `s`, returning it with the remainder
    fn split(s: &str) -> Option<(Self, &str)> {
        const OPS: [(&str, VersionOp); 8] = [
            ("<<", VersionOp::Less),
            ("<=", VersionOp::LessEqual),
            (">=", VersionOp::GreaterEqual),
            (">>", VersionOp::Greater),
            ("!=", VersionOp::NotEqual),
            ("=", VersionOp::Equal),
            ("<", VersionOp::LessEqual),
            (">", VersionOp::GreaterEqual),
        ];
        OPS.iter()
            .find_map(|(token, op)| s.strip_prefix(token).map(|rest| (*op, rest)))
    }
}

impl fmt::Display for VersionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single version relation, e.g. `>= 2.31-1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    pub op: VersionOp,
    pub version: Version,
}

impl VersionConstraint {
    #[must_use]
    pub fn new(op: VersionOp, version: Version) -> Self {
        Self { op, version }
    }

    /// Check if a version satisfies this constraint
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        let ord = version.cmp(&self.version);
        match self.op {
            VersionOp::Less => ord == Ordering::Less,
            VersionOp::LessEqual => ord != Ordering::Greater,
            VersionOp::Equal => ord == Ordering::Equal,
            VersionOp::GreaterEqual => ord != Ordering::Less,
            VersionOp::Greater => ord == Ordering::Greater,
            VersionOp::NotEqual => ord != Ordering::Equal,
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    /// Accepts `>= 1.0` as well as the parenthesised form `(>= 1.0)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed)
            .trim();

        let (op, rest) = VersionOp::split(inner).ok_or_else(|| VersionError::InvalidConstraint {
            input: s.to_string(),
        })?;

        let version = Version::parse(rest.trim()).map_err(|_| VersionError::InvalidConstraint {
            input: s.to_string(),
        })?;

        Ok(Self { op, version })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_tilde_sorts_first() {
        assert!(v("1.0~rc1") < v("1.0"));
        assert!(v("1.0~~") < v("1.0~"));
        assert!(v("1.0~") < v("1.0"));
        assert!(v("1.0") < v("1.0a"));
        assert!(v("1.0a") < v("1.0+"));
    }

    #[test]
    fn test_epoch_wins() {
        assert!(v("1:0.1") > v("9.9"));
        assert_eq!(v("0:1.2"), v("1.2"));
    }

    #[test]
    fn test_revision_compare() {
        assert!(v("2.31-13") > v("2.31-9"));
        assert!(v("2.31-13+deb11u5") > v("2.31-13"));
        assert!(v("1.2-1") > v("1.2"));
        assert_eq!(v("1.0-1").revision(), "1");
        assert_eq!(v("1.0-rc-1").upstream(), "1.0-rc");
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(v("1.002"), v("1.2"));
        assert!(v("1.10") > v("1.9"));
    }

    #[test]
    fn test_invalid_versions() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("a:1.0").is_err());
        assert!(Version::parse("1.0 beta").is_err());
        assert!(Version::parse("1:-1").is_err());
    }

    #[test]
    fn test_constraint_operators() {
        let c: VersionConstraint = "(>= 2.0)".parse().unwrap();
        assert!(c.matches(&v("2.0")));
        assert!(c.matches(&v("2.1")));
        assert!(!c.matches(&v("1.9")));

        let c: VersionConstraint = "<< 2.0".parse().unwrap();
        assert!(c.matches(&v("2.0~beta")));
        assert!(!c.matches(&v("2.0")));

        let c: VersionConstraint = "= 1:1.0-1".parse().unwrap();
        assert!(c.matches(&v("1:1.0-1")));
        assert!(!c.matches(&v("1.0-1")));
    }

    #[test]
    fn test_legacy_operators() {
        let c: VersionConstraint = "< 1.0".parse().unwrap();
        assert_eq!(c.op, VersionOp::LessEqual);
        let c: VersionConstraint = "> 1.0".parse().unwrap();
        assert_eq!(c.op, VersionOp::GreaterEqual);
    }

    #[test]
    fn test_constraint_display() {
        let c: VersionConstraint = "(>>1.2)".parse().unwrap();
        assert_eq!(c.to_string(), ">> 1.2");
        assert!("~= 1.0".parse::<VersionConstraint>().is_err());
    }
}
