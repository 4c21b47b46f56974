//! GStreamer codec matching against package records
//!
//! Values look like `gstreamer1(decoder-audio/mpeg)(mpegversion=1)(64bit)`.
//! The kind selects a `Gstreamer-*` record field and the optional fields
//! must be accepted by the matching caps entry.

use std::sync::LazyLock;

use pkgjob_store::control::parse_paragraphs;
use regex::Regex;

static CODEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gstreamer(?P<version>[0-9.]+)\((?P<kind>[a-z]+)-(?P<data>[^)]+)\)(?P<opts>.*)$")
        .expect("codec regex is valid")
});

static OPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("codec option regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
struct CodecRequest {
    version: String,
    field: &'static str,
    caps: bool,
    data: String,
    fields: Vec<(String, String)>,
    needs_64bit: bool,
}

/// Matcher built from a list of codec provide values
#[derive(Debug, Clone, Default)]
pub struct CodecMatcher {
    requests: Vec<CodecRequest>,
}

impl CodecMatcher {
    /// Parse `values`; malformed entries are skipped
    #[must_use]
    pub fn new<S: AsRef<str>>(values: &[S]) -> Self {
        let requests = values
            .iter()
            .filter_map(|v| {
                let parsed = parse_request(v.as_ref());
                if parsed.is_none() {
                    tracing::debug!(value = v.as_ref(), "not a gstreamer codec value");
                }
                parsed
            })
            .collect();
        Self { requests }
    }

    #[must_use]
    pub fn has_matches(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Whether the raw package `record` of a version built for `arch`
    /// provides any requested codec
    #[must_use]
    pub fn matches(&self, record: &str, arch: &str) -> bool {
        let Some(para) = parse_paragraphs(record).into_iter().next() else {
            return false;
        };
        let record_version = para.get("Gstreamer-Version");

        self.requests.iter().any(|req| {
            if req.needs_64bit && !is_64bit(arch) {
                return false;
            }
            if record_version.is_some_and(|v| v != req.version) {
                return false;
            }
            let Some(value) = para.get(req.field) else {
                return false;
            };
            if req.caps {
                split_top_level(value, ';').any(|caps| caps_accept(caps, req))
            } else {
                value.split(',').any(|name| name.trim() == req.data)
            }
        })
    }
}

fn parse_request(value: &str) -> Option<CodecRequest> {
    let caps = CODEC_RE.captures(value.trim())?;
    let (field, is_caps) = match &caps["kind"] {
        "decoder" => ("Gstreamer-Decoders", true),
        "encoder" => ("Gstreamer-Encoders", true),
        "urisource" => ("Gstreamer-Uri-Sources", false),
        "urisink" => ("Gstreamer-Uri-Sinks", false),
        "element" => ("Gstreamer-Elements", false),
        _ => return None,
    };

    let mut version = caps["version"].to_string();
    if version == "1" {
        version.push_str(".0");
    }

    let mut fields = Vec::new();
    let mut needs_64bit = false;
    for opt in OPT_RE.captures_iter(&caps["opts"]) {
        let opt = opt[1].trim();
        if opt == "64bit" {
            needs_64bit = true;
        } else if let Some((key, val)) = opt.split_once('=') {
            fields.push((key.trim().to_string(), val.trim().to_string()));
        }
    }

    Some(CodecRequest {
        version,
        field,
        caps: is_caps,
        data: caps["data"].to_string(),
        fields,
        needs_64bit,
    })
}

fn is_64bit(arch: &str) -> bool {
    arch.contains("64") || arch == "s390x"
}

/// One caps entry: `mime, key=(type)value, ...`
fn caps_accept(caps: &str, req: &CodecRequest) -> bool {
    let mut parts = split_top_level(caps, ',');
    if parts.next().map(str::trim) != Some(req.data.as_str()) {
        return false;
    }
    let present: Vec<(&str, &str)> = parts
        .filter_map(|p| p.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    req.fields.iter().all(|(key, wanted)| {
        // A field the caps do not constrain accepts any value
        present
            .iter()
            .find(|(k, _)| k == key)
            .is_none_or(|(_, value)| value_accepts(value, wanted))
    })
}

fn value_accepts(value: &str, wanted: &str) -> bool {
    let value = strip_type(value);
    if let Some(list) = value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
        return list.split(',').any(|item| strip_type(item.trim()) == wanted);
    }
    if let Some(range) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let bounds: Vec<i64> = range
            .split(',')
            .filter_map(|b| strip_type(b.trim()).parse().ok())
            .collect();
        return match (bounds.as_slice(), wanted.parse::<i64>()) {
            ([low, high], Ok(n)) => (*low..=*high).contains(&n),
            _ => false,
        };
    }
    value == wanted
}

/// Drop a leading `(int)` style type annotation
fn strip_type(value: &str) -> &str {
    let value = value.trim();
    if value.starts_with('(') {
        if let Some(end) = value.find(')') {
            return value[end + 1..].trim();
        }
    }
    value
}

/// Split on `sep` outside of brackets and braces
fn split_top_level(input: &str, sep: char) -> impl Iterator<Item = &str> {
    let mut depth = 0usize;
    let mut start = 0;
    let mut pieces = Vec::new();
    for (i, c) in input.char_indices() {
        match c {
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                pieces.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&input[start..]);
    pieces.into_iter().map(str::trim).filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = "Package: gst-plugins-ugly\n\
Gstreamer-Version: 1.0\n\
Gstreamer-Decoders: audio/mpeg, mpegversion=(int)1, layer=(int)[ 1, 3 ]; video/x-h264, stream-format=(string){ avc, byte-stream }\n\
Gstreamer-Elements: mpg123audiodec, x264enc\n\
Gstreamer-Uri-Sources: mms, mmsh\n";

    #[test]
    fn test_parse_version_and_options() {
        let matcher = CodecMatcher::new(&["gstreamer1(decoder-audio/mpeg)(mpegversion=1)(64bit)", "bogus"]);
        assert_eq!(matcher.requests.len(), 1);
        let req = &matcher.requests[0];
        assert_eq!(req.version, "1.0");
        assert_eq!(req.field, "Gstreamer-Decoders");
        assert!(req.needs_64bit);
        assert_eq!(req.fields, vec![("mpegversion".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_caps_fields() {
        let hit = CodecMatcher::new(&["gstreamer1(decoder-audio/mpeg)(mpegversion=1)(layer=3)"]);
        assert!(hit.matches(RECORD, "amd64"));

        let out_of_range = CodecMatcher::new(&["gstreamer1(decoder-audio/mpeg)(layer=4)"]);
        assert!(!out_of_range.matches(RECORD, "amd64"));

        let listed = CodecMatcher::new(&["gstreamer1.0(decoder-video/x-h264)(stream-format=avc)"]);
        assert!(listed.matches(RECORD, "amd64"));
    }

    #[test]
    fn test_names_and_arch() {
        assert!(CodecMatcher::new(&["gstreamer1(element-x264enc)"]).matches(RECORD, "i386"));
        assert!(CodecMatcher::new(&["gstreamer1(urisource-mmsh)"]).matches(RECORD, "i386"));
        assert!(!CodecMatcher::new(&["gstreamer1(urisink-mms)"]).matches(RECORD, "i386"));
        assert!(!CodecMatcher::new(&["gstreamer1(element-x264enc)(64bit)"]).matches(RECORD, "i386"));
        assert!(!CodecMatcher::new(&["gstreamer0.10(element-x264enc)"]).matches(RECORD, "amd64"));
    }
}
