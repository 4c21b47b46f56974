//! What-provides lookups for codecs, shared libraries and mimetypes

use std::sync::LazyLock;

use async_trait::async_trait;
use pkgjob_errors::Error;
use pkgjob_store::VersionKey;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::codec::CodecMatcher;
use crate::Query;

static LIBRARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(lib.*)\.so\.[0-9]*").expect("library regex is valid"));

/// Kind of capability a what-provides request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvidesKind {
    Any,
    Codec,
    SharedLibrary,
    Mimetype,
}

/// A metadata component advertising a mimetype
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeComponent {
    pub id: String,
    pub package: Option<String>,
}

/// Source of application metadata, loaded lazily per request
#[async_trait]
pub trait MimeIndex: Send + Sync {
    /// Load the metadata pool
    ///
    /// # Errors
    ///
    /// Returns a message describing why the pool could not be read.
    async fn load(&self) -> Result<(), String>;

    /// Components handling `mimetype`
    fn components_for(&self, mimetype: &str) -> Vec<MimeComponent>;
}

impl Query<'_> {
    /// Packages whose record advertises one of the GStreamer codec values
    #[must_use]
    pub fn provides_codec<S: AsRef<str>>(&self, values: &[S]) -> Vec<VersionKey> {
        let matcher = CodecMatcher::new(values);
        if !matcher.has_matches() {
            return Vec::new();
        }

        let store = self.store;
        let mut out = Vec::new();
        for (pk, pkg) in store.packages() {
            if self.cancelled() {
                break;
            }
            if store.is_empty_record(pk) {
                continue;
            }
            // Debug packages carry the metadata too but never provide the codec
            if pkg.name.ends_with("-debuginfo") || pkg.name.ends_with("-dbgsym") {
                continue;
            }
            let Some(vk) = store.find_version(pk).or_else(|| store.candidate_version(pk)) else {
                continue;
            };
            let ver = store.version(vk);
            if matcher.matches(&ver.record, &ver.arch) {
                out.push(vk);
            }
        }
        out
    }

    /// Packages named after the shared libraries in `values`
    ///
    /// `libfoo.so.1` maps to `libfoo1` and `libfoo2.so.3` to `libfoo2-3`.
    #[must_use]
    pub fn provides_library<S: AsRef<str>>(&self, values: &[S]) -> Vec<VersionKey> {
        let store = self.store;
        let mut out = Vec::new();
        for value in values {
            let value = value.as_ref();
            let Some(name) = library_package_name(value) else {
                continue;
            };
            tracing::debug!(value, name, "looking up library package");
            for (pk, pkg) in store.packages() {
                if self.cancelled() {
                    return out;
                }
                if pkg.name == name && !store.is_empty_record(pk) {
                    out.extend(store.find_version(pk).or_else(|| store.candidate_version(pk)));
                }
            }
        }
        out
    }

    /// Packages shipping applications that handle the mimetypes in `values`
    ///
    /// # Errors
    ///
    /// Returns an internal error when the metadata pool fails to load.
    pub async fn provides_mimetype<S: AsRef<str>>(
        &self,
        values: &[S],
        index: &dyn MimeIndex,
    ) -> Result<Vec<VersionKey>, Error> {
        index
            .load()
            .await
            .map_err(|message| Error::internal(format!("Failed to load AppStream metadata: {message}")))?;

        let store = self.store;
        let mut out = Vec::new();
        for mimetype in values {
            let mimetype = mimetype.as_ref();
            for component in index.components_for(mimetype) {
                if self.cancelled() {
                    return Ok(out);
                }
                let Some(package) = component.package.as_deref() else {
                    tracing::warn!(component = %component.id, "component has no package name");
                    continue;
                };
                let Some(pk) = store.find_by_name(package) else {
                    continue;
                };
                out.extend(store.find_version(pk));
            }
        }
        Ok(out)
    }
}

fn library_package_name(value: &str) -> Option<String> {
    if !value.starts_with("lib") {
        return None;
    }
    let caps = LIBRARY_RE.captures(value)?;
    let mut name = caps[1].to_string();
    let (_, soversion) = value.split_once(".so.")?;
    if name.ends_with(|c: char| c.is_ascii_digit()) {
        name.push('-');
    }
    name.push_str(soversion);
    Some(name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_package_name() {
        assert_eq!(library_package_name("libfoo.so.1").as_deref(), Some("libfoo1"));
        assert_eq!(library_package_name("libGL2.so.3").as_deref(), Some("libgl2-3"));
        assert_eq!(library_package_name("libssl.so.1.1").as_deref(), Some("libssl1.1"));
        assert_eq!(library_package_name("foo.so.1"), None);
        assert_eq!(library_package_name("libfoo"), None);
    }
}
