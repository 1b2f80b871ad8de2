//! Session Types
//!
//! Request and result types for upstream connect-session creation.

use serde::{Deserialize, Serialize};

use super::end_user::EndUserRef;
use super::integration::IntegrationRef;

/// Immutable description of one session-creation call.
///
/// Built once per inbound request by the input normalizer and resolver,
/// then handed unchanged to the session requester.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionSessionRequest {
    /// The principal the session is scoped to.
    pub end_user: EndUserRef,
    /// Requested integration scope, if any (None means picker mode).
    pub scope: Option<IntegrationRef>,
    /// Exact provider config key. Takes priority over `scope` when set.
    pub config_key: Option<String>,
    /// Caller's own success page, echoed to the upstream.
    pub success_redirect_url: Option<String>,
    /// Failure page derived from the caller's return URL.
    pub failure_redirect_url: Option<String>,
}

impl ConnectionSessionRequest {
    /// The resolved integration key restricting this session, if any.
    pub fn resolved_key(&self) -> Option<&str> {
        self.scope
            .as_ref()
            .and_then(|s| s.resolved_key.as_deref())
    }
}

/// Result of an upstream session-creation call.
///
/// `token` and `connect_link` are convenience probes over `raw`; `raw` is
/// retained verbatim for diagnostics. Invariant: downstream extraction must
/// find at least one usable value or the request fails with `MISSING_LINK`.
#[derive(Clone, Debug)]
pub struct ConnectionSessionResult {
    /// Session token, when the upstream returned one.
    pub token: Option<String>,
    /// Direct consent-screen link, when the upstream returned one.
    pub connect_link: Option<String>,
    /// Full upstream response payload.
    pub raw: serde_json::Value,
}

/// Response body of the token-issuance (POST) variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokenIssued {
    /// The short-lived connect session token.
    pub session_token: String,
    /// Consent-screen link, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_link: Option<String>,
    /// End-user id the session was created for.
    pub end_user_id: String,
    /// Resolved integration key the session is scoped to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_key_passthrough() {
        let request = ConnectionSessionRequest {
            end_user: EndUserRef::new("U1"),
            scope: Some(IntegrationRef {
                requested_slug: "mail".to_string(),
                resolved_key: Some("google-mail".to_string()),
            }),
            config_key: None,
            success_redirect_url: None,
            failure_redirect_url: None,
        };
        assert_eq!(request.resolved_key(), Some("google-mail"));
    }

    #[test]
    fn test_token_issued_wire_shape() {
        let issued = SessionTokenIssued {
            session_token: "tok_123".to_string(),
            connect_link: None,
            end_user_id: "U1".to_string(),
            provider: Some("hubspot".to_string()),
        };
        let json = serde_json::to_value(&issued).unwrap();
        assert_eq!(json["sessionToken"], "tok_123");
        assert_eq!(json["endUserId"], "U1");
        assert_eq!(json["provider"], "hubspot");
        assert!(json.get("connectLink").is_none());
    }
}
