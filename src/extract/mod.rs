//! Response Normalizer
//!
//! Extracts a usable consent link (or session token) from the upstream
//! session-creation payload. Response shapes vary by upstream API version:
//! the link may sit at the top level or under a `data` envelope, appear as
//! `connect_link` or `connect_url`, or be absent entirely with only a bare
//! session token one, two, or three levels deep. The precedence order is a
//! data-driven table evaluated top to bottom, first match wins, so a new
//! upstream shape is one table row, not another optional-chaining cascade.

use crate::error::{BrokerError, BrokerResult};

/// What a matched field contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    /// A full consent-screen URL, used as-is.
    Link,
    /// A bare session token; the link is synthesized from the template.
    Token,
}

/// One row of the extraction precedence table.
struct PrecedenceEntry {
    path: &'static [&'static str],
    name: &'static str,
    kind: FieldKind,
}

/// Extraction precedence, evaluated in order. Link fields always win over
/// tokens; within each kind, the `data`-enveloped shape precedes the
/// top-level one.
const PRECEDENCE: &[PrecedenceEntry] = &[
    PrecedenceEntry {
        path: &["data", "connect_link"],
        name: "data.connect_link",
        kind: FieldKind::Link,
    },
    PrecedenceEntry {
        path: &["connect_link"],
        name: "connect_link",
        kind: FieldKind::Link,
    },
    PrecedenceEntry {
        path: &["data", "connect_url"],
        name: "data.connect_url",
        kind: FieldKind::Link,
    },
    PrecedenceEntry {
        path: &["connect_url"],
        name: "connect_url",
        kind: FieldKind::Link,
    },
    // One upstream revision double-wrapped the token envelope.
    PrecedenceEntry {
        path: &["data", "data", "token"],
        name: "data.data.token",
        kind: FieldKind::Token,
    },
    PrecedenceEntry {
        path: &["data", "token"],
        name: "data.token",
        kind: FieldKind::Token,
    },
    PrecedenceEntry {
        path: &["token"],
        name: "token",
        kind: FieldKind::Token,
    },
];

/// Successfully extracted redirect material.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedLink {
    /// The consent-screen link (direct or synthesized).
    pub link: String,
    /// The session token, when the payload carried one.
    pub token: Option<String>,
    /// Dotted path of the matched field, for diagnostics.
    pub source: &'static str,
}

/// Walk a dotted path into the payload, yielding a non-empty string value.
///
/// Non-string or empty values at the path are treated as a miss so
/// evaluation continues down the table.
fn string_at<'a>(value: &'a serde_json::Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str().filter(|s| !s.is_empty())
}

/// Probe the payload for a session token along the token precedence paths.
pub fn probe_token(raw: &serde_json::Value) -> Option<String> {
    PRECEDENCE
        .iter()
        .filter(|entry| entry.kind == FieldKind::Token)
        .find_map(|entry| string_at(raw, entry.path))
        .map(str::to_string)
}

/// Probe the payload for a direct link along the link precedence paths.
pub fn probe_link(raw: &serde_json::Value) -> Option<String> {
    PRECEDENCE
        .iter()
        .filter(|entry| entry.kind == FieldKind::Link)
        .find_map(|entry| string_at(raw, entry.path))
        .map(str::to_string)
}

/// Extract the consent link from an upstream payload.
///
/// Fails with `MISSING_LINK` (carrying the raw payload for diagnostics)
/// when no table row matches.
pub fn extract_link(raw: &serde_json::Value, link_template: &str) -> BrokerResult<ExtractedLink> {
    for entry in PRECEDENCE {
        if let Some(value) = string_at(raw, entry.path) {
            return Ok(match entry.kind {
                FieldKind::Link => ExtractedLink {
                    link: value.to_string(),
                    token: probe_token(raw),
                    source: entry.name,
                },
                FieldKind::Token => ExtractedLink {
                    link: link_template.replace("{token}", value),
                    token: Some(value.to_string()),
                    source: entry.name,
                },
            });
        }
    }

    Err(BrokerError::MissingLink { raw: raw.clone() })
}
