//! deb822 control-file parsing
//!
//! Covers the subset needed to load package lists and the status
//! database: paragraphs, folded fields, the `Status` triple and
//! relationship fields.

use pkgjob_errors::VersionError;
use pkgjob_types::{CurrentState, Selection, VersionConstraint};

/// One stanza of a control file
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    fields: Vec<(String, String)>,
    raw: String,
}

impl Paragraph {
    /// Field value by case-insensitive name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Split a control file into paragraphs
///
/// Continuation lines keep their leading whitespace so multi-line fields
/// such as `Description` can be reformatted later.
#[must_use]
pub fn parse_paragraphs(text: &str) -> Vec<Paragraph> {
    let mut out = Vec::new();
    let mut current = Paragraph::default();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        current.raw.push_str(line);
        current.raw.push('\n');

        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = current.fields.last_mut() {
                value.push('\n');
                value.push_str(line);
            }
            continue;
        }

        match line.split_once(':') {
            Some((key, value)) => current
                .fields
                .push((key.trim().to_string(), value.trim().to_string())),
            None => tracing::debug!(line, "ignoring malformed control line"),
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Decoded `Status: <want> <flag> <state>` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusField {
    pub selection: Selection,
    pub reinstall_required: bool,
    pub state: CurrentState,
}

impl StatusField {
    /// Whether the status gives the package a current version
    #[must_use]
    pub fn has_current_version(&self) -> bool {
        !matches!(
            self.state,
            CurrentState::NotInstalled | CurrentState::ConfigFiles
        )
    }
}

#[must_use]
pub fn parse_status(value: &str) -> Option<StatusField> {
    let mut words = value.split_whitespace();
    let (want, flag, state) = (words.next()?, words.next()?, words.next()?);

    let selection = match want {
        "install" => Selection::Install,
        "hold" => Selection::Hold,
        "deinstall" => Selection::DeInstall,
        "purge" => Selection::Purge,
        _ => Selection::Unknown,
    };
    let state = match state {
        "installed" => CurrentState::Installed,
        "config-files" => CurrentState::ConfigFiles,
        "half-installed" => CurrentState::HalfInstalled,
        "unpacked" => CurrentState::Unpacked,
        "half-configured" => CurrentState::HalfConfigured,
        "triggers-awaited" => CurrentState::TriggersAwaited,
        "triggers-pending" => CurrentState::TriggersPending,
        _ => CurrentState::NotInstalled,
    };

    Some(StatusField {
        selection,
        reinstall_required: flag == "reinstreq",
        state,
    })
}

/// Unresolved relation alternative as written in a control file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationAtom {
    pub name: String,
    /// Explicit `:arch` qualifier; `:any` is dropped
    pub arch: Option<String>,
    pub constraint: Option<VersionConstraint>,
}

/// Parse a relationship field into OR-groups
///
/// Architecture restrictions (`[amd64]`) and build profiles (`<!nocheck>`)
/// are ignored.
///
/// # Errors
///
/// Returns `VersionError::InvalidDependency` for an alternative without a
/// package name, or the constraint's error when it does not parse.
pub fn parse_relations(value: &str) -> Result<Vec<Vec<RelationAtom>>, VersionError> {
    let mut groups = Vec::new();
    for group in value.split(',') {
        let group = group.trim();
        if group.is_empty() {
            continue;
        }
        let mut alternatives = Vec::new();
        for alt in group.split('|') {
            alternatives.push(parse_atom(alt)?);
        }
        groups.push(alternatives);
    }
    Ok(groups)
}

fn parse_atom(input: &str) -> Result<RelationAtom, VersionError> {
    let cleaned = strip_qualifiers(input);
    let cleaned = cleaned.trim();

    let (name_part, constraint) = match cleaned.split_once('(') {
        Some((name, rest)) => {
            let inner = rest.trim_end().trim_end_matches(')');
            (name.trim(), Some(inner.parse::<VersionConstraint>()?))
        }
        None => (cleaned, None),
    };

    if name_part.is_empty() || name_part.contains(char::is_whitespace) {
        return Err(VersionError::InvalidDependency {
            input: input.trim().to_string(),
        });
    }

    let (name, arch) = match name_part.split_once(':') {
        Some((name, "any")) => (name, None),
        Some((name, arch)) => (name, Some(arch.to_string())),
        None => (name_part, None),
    };

    Ok(RelationAtom {
        name: name.to_string(),
        arch,
        constraint,
    })
}

// Drop `[arch list]` and `<profile>` segments outside the version parens
fn strip_qualifiers(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_parens = false;
    let mut skip_until = None;
    for c in input.chars() {
        if let Some(close) = skip_until {
            if c == close {
                skip_until = None;
            }
            continue;
        }
        match c {
            '(' => in_parens = true,
            ')' => in_parens = false,
            '[' if !in_parens => {
                skip_until = Some(']');
                continue;
            }
            '<' if !in_parens => {
                skip_until = Some('>');
                continue;
            }
            _ => {}
        }
        out.push(c);
    }
    out
}
