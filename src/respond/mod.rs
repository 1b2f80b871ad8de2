//! Response Building
//!
//! Framework-neutral response values for the broker surface. The embedding
//! HTTP layer (CORS preflight, method checks, the server itself) is an
//! external collaborator; it only has to copy status, headers, and body.

use serde::Serialize;

use crate::error::BrokerError;
use crate::types::{RedirectTarget, SessionTokenIssued};

/// A response the embedding HTTP layer can emit verbatim.
#[derive(Clone, Debug)]
pub struct BrokerResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, in emission order.
    pub headers: Vec<(String, String)>,
    /// Response body (empty for redirects).
    pub body: String,
}

impl BrokerResponse {
    /// Look up a header by (lowercase) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Headers attached to every broker response: permissive CORS plus cache
/// suppression, so repeated clicks from a front-end never hit a stale
/// redirect.
fn base_headers() -> Vec<(String, String)> {
    vec![
        ("access-control-allow-origin".to_string(), "*".to_string()),
        (
            "access-control-allow-methods".to_string(),
            "GET, POST, OPTIONS".to_string(),
        ),
        (
            "access-control-allow-headers".to_string(),
            "Content-Type, Authorization".to_string(),
        ),
        (
            "cache-control".to_string(),
            "no-store, no-cache, must-revalidate, proxy-revalidate, max-age=0".to_string(),
        ),
    ]
}

fn json_response(status: u16, body: &impl Serialize) -> BrokerResponse {
    let mut headers = base_headers();
    headers.push((
        "content-type".to_string(),
        "application/json".to_string(),
    ));
    BrokerResponse {
        status,
        headers,
        body: serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string()),
    }
}

/// Redirect the caller's browser to the consent screen.
pub fn redirect(target: &RedirectTarget) -> BrokerResponse {
    let mut headers = base_headers();
    headers.push(("location".to_string(), target.url.clone()));
    BrokerResponse {
        status: target.status.as_u16(),
        headers,
        body: String::new(),
    }
}

/// Diagnostic payload returned instead of the redirect when `debug` is set.
#[derive(Clone, Debug, Serialize)]
pub struct DebugReport {
    /// Sanitized slug the caller supplied.
    pub provider_slug: String,
    /// Canonical key the session was scoped to, if any.
    pub resolved_key: Option<String>,
    /// End-user id the session was created for.
    pub end_user_id: String,
    /// Constructed upstream request (credential redacted).
    pub upstream_request: serde_json::Value,
    /// Raw upstream response payload.
    pub upstream_response: serde_json::Value,
    /// The link the non-debug flow would have redirected to.
    pub oauth_connect_url: String,
}

/// Emit the debug diagnostic: 200 JSON, never a redirect.
pub fn debug_report(report: &DebugReport) -> BrokerResponse {
    json_response(200, report)
}

/// Emit the token-issuance (POST variant) success body.
pub fn token_issued(issued: &SessionTokenIssued) -> BrokerResponse {
    json_response(200, issued)
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    details: serde_json::Value,
}

/// Map a broker error to its structured response.
///
/// Every failure path ends here; no stage leaves the caller without a
/// response. In production mode upstream payloads are redacted to a short
/// summary.
pub fn error_response(error: &BrokerError, production: bool) -> BrokerResponse {
    json_response(
        error.http_status(),
        &ErrorBody {
            error: error.error_code(),
            details: error.details(production),
        },
    )
}
