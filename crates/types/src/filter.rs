//! Query filters
//!
//! Filters are independent predicates that all have to hold for a version
//! to be reported. A filter and its negation can both be set, in which case
//! nothing passes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Installed,
    NotInstalled,
    Development,
    NotDevelopment,
    Gui,
    NotGui,
    Free,
    NotFree,
    Downloaded,
    NotDownloaded,
    Arch,
    NotArch,
    Newest,
    NotNewest,
    Collections,
    NotCollections,
}

impl Filter {
    const ALL: [Filter; 16] = [
        Filter::Installed,
        Filter::NotInstalled,
        Filter::Development,
        Filter::NotDevelopment,
        Filter::Gui,
        Filter::NotGui,
        Filter::Free,
        Filter::NotFree,
        Filter::Downloaded,
        Filter::NotDownloaded,
        Filter::Arch,
        Filter::NotArch,
        Filter::Newest,
        Filter::NotNewest,
        Filter::Collections,
        Filter::NotCollections,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Client token, `~` marks the negated form
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::NotInstalled => "~installed",
            Self::Development => "devel",
            Self::NotDevelopment => "~devel",
            Self::Gui => "gui",
            Self::NotGui => "~gui",
            Self::Free => "free",
            Self::NotFree => "~free",
            Self::Downloaded => "downloaded",
            Self::NotDownloaded => "~downloaded",
            Self::Arch => "arch",
            Self::NotArch => "~arch",
            Self::Newest => "newest",
            Self::NotNewest => "~newest",
            Self::Collections => "collections",
            Self::NotCollections => "~collections",
        }
    }
}

/// Set of requested filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterSet {
    bits: u32,
}

impl FilterSet {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.insert(filter);
        self
    }

    pub fn insert(&mut self, filter: Filter) {
        self.bits |= filter.bit();
    }

    #[must_use]
    pub fn contains(self, filter: Filter) -> bool {
        self.bits & filter.bit() != 0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Filter> {
        Filter::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// Parse a `;`-separated token list such as `installed;~devel`.
    /// `none` and unknown tokens are ignored.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        s.split(';')
            .map(str::trim)
            .filter_map(|token| Filter::ALL.into_iter().find(|f| f.as_str() == token))
            .collect()
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        let mut set = Self::none();
        for filter in iter {
            set.insert(filter);
        }
        set
    }
}

impl std::fmt::Display for FilterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let tokens: Vec<&str> = self.iter().map(Filter::as_str).collect();
        f.write_str(&tokens.join(";"))
    }
}
