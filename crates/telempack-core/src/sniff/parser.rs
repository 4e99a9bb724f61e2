use std::sync::LazyLock;

use regex::bytes::Regex;
use serde::Serialize;

use super::error::DetectError;
use super::layout;

/// Content classification of an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// A packetized stream.
    Stream,
    /// A standalone, non-packetized XML document.
    Document,
}

/// On-wire packet delimiting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStyle {
    /// Fixed 4-byte bracketed tags (legacy dialect).
    Fixed,
    /// Pipe-delimited variable tags (current dialect).
    Variable,
    /// Not packetized at all (document mode).
    None,
}

/// Facts established by sniffing the first bytes of an input. Immutable for
/// the lifetime of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
    pub content: ContentKind,
    /// Declared protocol version. `None` marks the older unversioned
    /// query-stream flavor, which the reader does not support.
    pub version: Option<String>,
    pub tag_style: TagStyle,
    /// Whether the stream element declares XML namespaces, which selects
    /// the schema variant an external validator should apply.
    pub namespaces: bool,
}

static STREAM_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*stream").expect("stream element pattern"));

static VERSION_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"version\s*=\s*"(.*?)""#).expect("version attribute pattern"));

static XMLNS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"xmlns(:[A-Za-z0-9_\-]+)?\s*=\s*""#).expect("xmlns attribute pattern")
});

/// Classify an input from its leading bytes (up to [`layout::SNIFF_WINDOW`]).
///
/// The first four bytes discriminate the two packetized dialects; anything
/// else must be a plain XML document with a prolog. The `<stream>` element is
/// located by pattern search because a full parse is not yet possible at this
/// point, and its `version` attribute (when present) pins the protocol
/// generation.
///
/// # Errors
/// Returns `DetectError` when fewer than [`layout::MIN_SNIFF_BYTES`] bytes
/// are available, the preamble is unrecognized, or no `<stream>` element can
/// be found in the window.
pub fn sniff(first: &[u8]) -> Result<StreamInfo, DetectError> {
    if first.len() < layout::MIN_SNIFF_BYTES {
        return Err(DetectError::TooShort { len: first.len() });
    }

    let (content, tag_style) = if first.starts_with(layout::VARIABLE_MAGIC) {
        (ContentKind::Stream, TagStyle::Variable)
    } else if first.starts_with(layout::FIXED_MAGIC) {
        (ContentKind::Stream, TagStyle::Fixed)
    } else {
        if !contains(first, layout::XML_PROLOG) {
            return Err(DetectError::MissingProlog);
        }
        (ContentKind::Document, TagStyle::None)
    };

    let stream_el = STREAM_ELEMENT
        .find(first)
        .ok_or(DetectError::MissingStreamElement { len: first.len() })?;
    let after_stream = &first[stream_el.end()..];

    let version = match VERSION_ATTR.captures(after_stream) {
        Some(caps) => Some(String::from_utf8_lossy(&caps[1]).trim().to_string()),
        // No version attribute: either the unversioned query-stream flavor
        // or a legacy stream that simply omits it.
        None if contains(first, layout::UNVERSIONED_TOKEN) => None,
        None => Some(layout::DEFAULT_VERSION.to_string()),
    };

    let namespaces = XMLNS_ATTR.is_match(after_stream);

    Ok(StreamInfo {
        content,
        version,
        tag_style,
        namespaces,
    })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
