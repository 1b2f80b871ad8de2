//! Integration Resolver
//!
//! Pure mapping from a caller-supplied integration slug to the canonical
//! upstream integration key. No I/O: resolution is a deterministic function
//! of the slug, the static alias table, and the configured default key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::params::sanitize_slug;
use crate::types::IntegrationRef;

/// Static mapping of deprecated or ambiguous slugs to canonical keys.
///
/// Aliasing is one-directional: `mail -> google-mail-prod` does not imply
/// anything about resolving `google-mail-prod`, which passes through as a
/// canonical key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasTable(BTreeMap<String, String>);

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one alias. The alias side is sanitized the same way inbound
    /// slugs are, so table entries match what normalization produces.
    pub fn alias(mut self, from: impl AsRef<str>, to: impl Into<String>) -> Self {
        self.0.insert(sanitize_slug(from.as_ref()), to.into());
        self
    }

    /// Look up a sanitized slug.
    pub fn get(&self, slug: &str) -> Option<&str> {
        self.0.get(slug).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<F: AsRef<str>, T: Into<String>> FromIterator<(F, T)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (F, T)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |table, (from, to)| table.alias(from, to))
    }
}

/// Resolve a sanitized slug to the canonical upstream integration key.
///
/// - Empty slug: the configured default key, else `None` (picker mode).
/// - Known alias: the alias target.
/// - Anything else: passed through verbatim; unknown slugs are forwarded
///   and the upstream rejects them itself.
pub fn resolve(
    requested_slug: &str,
    alias_table: &AliasTable,
    default_key: Option<&str>,
) -> Option<String> {
    if requested_slug.is_empty() {
        return default_key.map(str::to_string);
    }
    match alias_table.get(requested_slug) {
        Some(canonical) => Some(canonical.to_string()),
        None => Some(requested_slug.to_string()),
    }
}

/// Resolve into a full [`IntegrationRef`] carrying both sides.
pub fn resolve_ref(
    requested_slug: &str,
    alias_table: &AliasTable,
    default_key: Option<&str>,
) -> IntegrationRef {
    IntegrationRef {
        requested_slug: requested_slug.to_string(),
        resolved_key: resolve(requested_slug, alias_table, default_key),
    }
}
