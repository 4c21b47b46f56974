//! Package details and description formatting

use pkgjob_events::PackageDetails;
use pkgjob_store::VersionKey;
use pkgjob_types::Group;

use crate::filter::{is_installed_version, sort_and_dedup};
use crate::Query;

impl Query<'_> {
    /// Details for each distinct version in `versions`
    #[must_use]
    pub fn get_details(&self, mut versions: Vec<VersionKey>) -> Vec<PackageDetails> {
        let store = self.store;
        sort_and_dedup(store, &mut versions);

        let mut out = Vec::with_capacity(versions.len());
        for vk in versions {
            if self.cancelled() {
                break;
            }
            let ver = store.version(vk);
            let size = if is_installed_version(store, vk) {
                ver.installed_size
            } else {
                ver.download_size
            };
            out.push(PackageDetails {
                package_id: store.build_identifier(vk).to_string(),
                summary: ver.summary.clone(),
                description: parse_long_description(&ver.description),
                group: Group::from_section(&ver.section),
                section: ver.section.clone(),
                size,
            });
        }
        out
    }
}

/// Reflow a control-file `Description` into display text
///
/// The synopsis line is dropped. Lines starting with a second space are
/// kept verbatim, a lone `.` separates paragraphs and every other line is
/// folded into the previous one.
#[must_use]
pub fn parse_long_description(text: &str) -> String {
    let Some((_, body)) = text.split_once('\n') else {
        return text.to_string();
    };

    let mut lines = body.split('\n').map(drop_first_char);
    let mut out = String::with_capacity(body.len());
    if let Some(first) = lines.next() {
        out.push_str(first);
    }

    let mut after_full_stop = false;
    for line in lines {
        if let Some(rest) = line.strip_prefix('.') {
            out.push('\n');
            out.push_str(rest);
            after_full_stop = true;
            continue;
        }
        if line.starts_with(' ') || after_full_stop {
            out.push('\n');
        } else {
            out.push(' ');
        }
        out.push_str(line);
        after_full_stop = false;
    }
    out
}

fn drop_first_char(line: &str) -> &str {
    let mut chars = line.chars();
    chars.next();
    chars.as_str()
}
