//! End-User Types
//!
//! Identification of the principal a connection is brokered for.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to an end user in the upstream connection broker.
///
/// Serializes into the exact wire shape the upstream expects for both the
/// user upsert and the session-creation `end_user` object; optional fields
/// are omitted entirely when absent.
///
/// The `id` is the stable identity: the upstream upsert is idempotent over
/// it, so repeating a call with the same id never creates duplicates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndUserRef {
    /// Stable end-user identifier (trimmed, non-empty).
    pub id: String,
    /// Email shown in the upstream consent UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name shown in the upstream consent UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Free-form tags attached to the upstream user record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, serde_json::Value>>,
}

impl EndUserRef {
    /// Create a reference carrying only the id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
            tags: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_are_omitted() {
        let user = EndUserRef::new("U1");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({"id": "U1"}));
    }

    #[test]
    fn test_profile_fields_serialize() {
        let mut tags = BTreeMap::new();
        tags.insert("project".to_string(), serde_json::json!("mindlink"));
        let user = EndUserRef {
            id: "U1".to_string(),
            email: Some("u1@example.com".to_string()),
            display_name: Some("User One".to_string()),
            tags: Some(tags),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "u1@example.com");
        assert_eq!(json["display_name"], "User One");
        assert_eq!(json["tags"]["project"], "mindlink");
    }
}
