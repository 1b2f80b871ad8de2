//! Integration Types
//!
//! Reference to one third-party connector within the upstream broker.

use serde::{Deserialize, Serialize};

/// A caller-requested integration and its resolved canonical key.
///
/// `resolved_key == None` means no integration was requested: the session
/// is created unscoped and the upstream shows its interactive picker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRef {
    /// Slug as supplied by the caller, after sanitization.
    pub requested_slug: String,
    /// Canonical upstream integration key, if one was resolved.
    pub resolved_key: Option<String>,
}

impl IntegrationRef {
    /// Check whether this reference scopes the session to one integration.
    pub fn is_scoped(&self) -> bool {
        self.resolved_key.is_some()
    }
}
