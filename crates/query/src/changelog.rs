//! Debian changelog parsing for update details

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use pkgjob_types::Version;
use regex::Regex;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<source>.+) \((?P<version>.*)\) (?P<dist>.+); urgency=(?P<urgency>.+)")
        .expect("changelog header regex is valid")
});

static TRAILER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^ -- (?P<maintainer>.+) (?P<mail><.+>)  (?P<date>.+)$")
        .expect("changelog trailer regex is valid")
});

static CVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CVE-\d{4}-\d{4,}").expect("cve regex is valid"));

static LAUNCHPAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)LP:\s+(?:[,\s*]?#(\d+))*").expect("launchpad regex is valid"));

static DEBIAN_BUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)closes:\s*(?:bug)?#?\s?(\d+)(?:,\s*(?:bug)?#?\s?(\d+))*")
        .expect("debian bug regex is valid")
});

/// What a changelog says about the versions newer than the installed one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogInfo {
    pub changelog: String,
    pub update_text: String,
    pub issued: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub cve_urls: Vec<String>,
    pub bugzilla_urls: Vec<String>,
}

/// Parse the changelog of `source` down to the entry for `current`
///
/// Parsing stops at the first entry that is not newer than `current`.
/// `issued` is the oldest trailer date seen and `updated` the newest,
/// cleared when both are the same.
#[must_use]
pub fn parse_changelog(text: &str, source: &str, current: Option<&Version>) -> ChangelogInfo {
    let mut info = ChangelogInfo::default();

    for raw in text.lines() {
        // A second leading space confuses markdown renderers on the client
        let line = if raw.starts_with("  ") { &raw[1..] } else { raw };
        if line.is_empty() {
            info.changelog.push('\n');
            continue;
        }

        if line.starts_with(source) {
            if let Some(caps) = HEADER_RE.captures(line) {
                let version = &caps["version"];
                let not_newer = match (Version::parse(version), current) {
                    (Ok(version), Some(current)) => version <= *current,
                    _ => false,
                };
                if not_newer {
                    break;
                }
                if !info.update_text.is_empty() {
                    info.update_text.push_str("\n\n");
                }
                info.update_text.push_str(" == ");
                info.update_text.push_str(version);
                info.update_text.push_str(" ==");
            }
        } else if line.starts_with(" --") {
            if let Some(date) = TRAILER_RE.captures(line).and_then(|c| parse_date(&c["date"])) {
                info.issued = Some(date);
                if info.updated.is_none() {
                    info.updated = Some(date);
                }
            }
        } else if line.starts_with(' ') {
            info.update_text.push('\n');
            info.update_text.push_str(line);
        }

        info.changelog.push_str(line);
        info.changelog.push('\n');
    }

    let trimmed = info.changelog.trim_end_matches([' ', '\t', '\n']).len();
    info.changelog.truncate(trimmed);
    if info.updated == info.issued {
        info.updated = None;
    }

    info.cve_urls = cve_urls(&info.changelog);
    info.bugzilla_urls = bug_urls(&info.changelog);
    info
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc2822(value.trim()) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(err) => {
            tracing::debug!(value, %err, "unparseable changelog date");
            None
        }
    }
}

/// NVD links for every CVE id mentioned in `text`
#[must_use]
fn cve_urls(text: &str) -> Vec<String> {
    CVE_RE
        .find_iter(text)
        .map(|m| format!("https://web.nvd.nist.gov/view/vuln/detail?vulnId={}", m.as_str()))
        .collect()
}

/// Launchpad and Debian bug tracker links for the bugs `text` closes
#[must_use]
fn bug_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = LAUNCHPAD_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|bug| format!("https://bugs.launchpad.net/bugs/{}", bug.as_str()))
        .collect();

    for caps in DEBIAN_BUG_RE.captures_iter(text) {
        for bug in [caps.get(1), caps.get(2)].into_iter().flatten() {
            urls.push(format!(
                "https://bugs.debian.org/cgi-bin/bugreport.cgi?bug={}",
                bug.as_str()
            ));
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = "\
hello (2.1-1) unstable; urgency=medium

  * Fix overflow, CVE-2024-12345 (Closes: #1001, #1002)
  * Crash on start (LP: #42)

 -- Jane Doe <jane@example.org>  Tue, 02 Jan 2024 10:00:00 +0000

hello (2.0-1) unstable; urgency=low

  * Previous release

 -- Jane Doe <jane@example.org>  Mon, 01 Jan 2024 10:00:00 +0000

hello (1.0-1) unstable; urgency=low

  * Installed release
";

    #[test]
    fn test_stops_at_current_version() {
        let current = Version::parse("1.0-1").unwrap();
        let info = parse_changelog(CHANGELOG, "hello", Some(&current));

        assert!(info.update_text.starts_with(" == 2.1-1 =="));
        assert!(info.update_text.contains("\n\n == 2.0-1 =="));
        assert!(!info.update_text.contains("1.0-1"));
        assert!(!info.changelog.contains("Installed release"));
        assert!(!info.changelog.ends_with('\n'));
    }

    #[test]
    fn test_dates() {
        let current = Version::parse("1.0-1").unwrap();
        let info = parse_changelog(CHANGELOG, "hello", Some(&current));
        assert_eq!(info.updated.map(|d| d.to_rfc3339()).as_deref(), Some("2024-01-02T10:00:00+00:00"));
        assert_eq!(info.issued.map(|d| d.to_rfc3339()).as_deref(), Some("2024-01-01T10:00:00+00:00"));

        let single = parse_changelog(CHANGELOG, "hello", Some(&Version::parse("2.0-1").unwrap()));
        assert!(single.issued.is_some());
        assert_eq!(single.updated, None);
    }

    #[test]
    fn test_urls() {
        let info = parse_changelog(CHANGELOG, "hello", None);
        assert_eq!(
            info.cve_urls,
            vec!["https://web.nvd.nist.gov/view/vuln/detail?vulnId=CVE-2024-12345".to_string()]
        );
        assert_eq!(
            info.bugzilla_urls,
            vec![
                "https://bugs.launchpad.net/bugs/42".to_string(),
                "https://bugs.debian.org/cgi-bin/bugreport.cgi?bug=1001".to_string(),
                "https://bugs.debian.org/cgi-bin/bugreport.cgi?bug=1002".to_string(),
            ]
        );
    }
}
