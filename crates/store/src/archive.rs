//! Local archive naming

use crate::model::PackageVersion;

/// Percent-quote `input` the way APT names cached archives
///
/// Characters in `bad`, `%`, and anything outside printable ASCII become
/// lowercase `%xx` escapes.
#[must_use]
pub fn quote_string(input: &str, bad: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        let quote = byte == b'%'
            || byte <= 0x20
            || byte >= 0x7f
            || bad.as_bytes().contains(&byte);
        if quote {
            out.push_str(&format!("%{byte:02x}"));
        } else {
            out.push(char::from(byte));
        }
    }
    out
}

/// File name of a version's archive inside the archive directory
///
/// `name_version_arch.ext`, with the extension taken from the index
/// `Filename` (defaulting to `deb`).
#[must_use]
pub fn archive_file_name(name: &str, ver: &PackageVersion) -> String {
    let ext = ver
        .filename
        .as_deref()
        .and_then(|f| f.rsplit('/').next())
        .and_then(|f| f.rsplit_once('.'))
        .map_or("deb", |(_, ext)| ext);
    format!(
        "{}_{}_{}.{}",
        quote_string(name, "_:"),
        quote_string(ver.version.as_str(), "_:"),
        quote_string(&ver.arch, "_:."),
        ext
    )
}

/// Download URI of a version: its first downloadable origin joined with
/// the index file name
#[must_use]
pub fn archive_uri(ver: &PackageVersion) -> Option<String> {
    let base = ver.download_origin()?.uri.as_deref()?;
    let file = ver.filename.as_deref()?;
    Some(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        file.trim_start_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("1:2.0-1", "_:"), "1%3a2.0-1");
        assert_eq!(quote_string("a_b", "_:"), "a%5fb");
        assert_eq!(quote_string("x86.64", "_:."), "x86%2e64");
        assert_eq!(quote_string("50%", ""), "50%25");
        assert_eq!(quote_string("a b", ""), "a%20b");
        assert_eq!(quote_string("plain", "_:"), "plain");
    }
}
