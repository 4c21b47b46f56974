//! Unmet-dependency report
//!
//! Renders the familiar block of text shown when a transaction cannot be
//! satisfied:
//!
//! ```text
//! The following packages have unmet dependencies:
//!   app: Depends: libfoo (>= 2.0) but 1.0 is to be installed
//!        Depends: gui-a but it is not installable or
//!                 gui-b but it is not going to be installed
//! ```

use std::fmt::Write as _;

use pkgjob_store::{DepAtom, PackageKey};

use crate::depcache::{DepCache, Which};

pub const REPORT_HEADER: &str = "The following packages have unmet dependencies:";

/// Report for the state the transaction would leave behind
#[must_use]
pub fn install_report(cache: &DepCache) -> String {
    unmet_report(cache, Which::Install)
}

/// Report for the currently installed state
#[must_use]
pub fn now_report(cache: &DepCache) -> String {
    unmet_report(cache, Which::Now)
}

#[must_use]
pub fn unmet_report(cache: &DepCache, which: Which) -> String {
    let store = cache.store();
    let mut out = String::from(REPORT_HEADER);
    out.push('\n');

    for (pk, pkg) in store.packages() {
        let broken = match which {
            Which::Now => cache.now_broken(pk),
            Which::Install => cache.inst_broken(pk),
        };
        if !broken {
            continue;
        }
        let vk = match which {
            Which::Now => cache.current(pk),
            Which::Install => cache.install_version(pk),
        };
        let Some(vk) = vk else {
            continue;
        };

        let _ = write!(out, "  {}:", pkg.name);
        let indent = pkg.name.len() + 3;
        let mut first = true;

        for group in &store.version(vk).depends {
            if !group.kind.is_critical() || cache.group_holds(pk, group, which) {
                continue;
            }
            let dep_type = group.kind.as_str();
            let last = group.alternatives.len().saturating_sub(1);
            for (i, atom) in group.alternatives.iter().enumerate() {
                if !first {
                    out.push_str(&" ".repeat(indent));
                }
                first = false;
                if i == 0 {
                    let _ = write!(out, " {dep_type}: ");
                } else {
                    out.push_str(&" ".repeat(dep_type.len() + 3));
                }
                out.push_str(&store.package(atom.target).name);
                if let Some(constraint) = &atom.constraint {
                    let _ = write!(out, " ({} {})", constraint.op, constraint.version);
                }
                if let Some(summary) = target_summary(cache, atom, which) {
                    out.push(' ');
                    out.push_str(&summary);
                }
                if i != last {
                    out.push_str(" or");
                }
                out.push('\n');
            }
        }
        if first {
            out.push('\n');
        }
    }
    out
}

fn target_summary(cache: &DepCache, atom: &DepAtom, which: Which) -> Option<String> {
    let store = cache.store();
    let target: PackageKey = atom.target;
    let has_providers = !store.providers(target).is_empty();
    let has_versions = !store.package(target).versions.is_empty();

    if has_providers && cache.candidate(target).is_none() {
        return has_versions.then(|| "but it is a virtual package".to_string());
    }

    let version = match which {
        Which::Now => cache.current(target),
        Which::Install => cache.install_version(target),
    };
    Some(match (version, which) {
        (Some(vk), Which::Now) => format!("but {} is installed", store.version(vk).version),
        (Some(vk), Which::Install) => {
            format!("but {} is to be installed", store.version(vk).version)
        }
        (None, _) if cache.candidate(target).is_none() => "but it is not installable".to_string(),
        (None, Which::Now) => "but it is not installed".to_string(),
        (None, Which::Install) => "but it is not going to be installed".to_string(),
    })
}
