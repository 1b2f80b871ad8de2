//! Broker Error Types
//!
//! Error taxonomy for the connection session broker, with mapping to
//! HTTP status codes and machine-readable error codes.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the connection session broker.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("Missing credential: {field} is not provisioned")]
    MissingCredential { field: String },

    #[error("Upstream returned HTTP {status}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Upstream call timed out after {timeout:?}")]
    UpstreamTimeout { timeout: Duration },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Upstream response contains no connect link or session token")]
    MissingLink { raw: serde_json::Value },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BrokerError {
    /// Machine-readable error code surfaced to the caller.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::MissingCredential { .. } => "MISSING_CREDENTIAL",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
            Self::Network { .. } => "UPSTREAM_ERROR",
            Self::MissingLink { .. } => "MISSING_LINK",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code the caller receives for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::MissingCredential { .. } => 500,
            Self::Upstream { .. } => 502,
            Self::UpstreamTimeout { .. } => 504,
            Self::Network { .. } => 502,
            Self::MissingLink { .. } => 502,
            Self::Internal { .. } => 500,
        }
    }

    /// Check if error is retryable (transient network conditions only).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout { .. } | Self::Network { .. }
        )
    }

    /// Diagnostic payload attached to the error response, if any.
    ///
    /// Redacted to a short summary when `production` is set, since upstream
    /// bodies may echo end-user profile fields.
    pub fn details(&self, production: bool) -> serde_json::Value {
        match self {
            Self::Validation { message } => serde_json::Value::String(message.clone()),
            Self::MissingCredential { field } => {
                serde_json::Value::String(format!("{} is not configured", field))
            }
            Self::Upstream { status, body } => {
                if production {
                    serde_json::Value::String(format!("upstream HTTP {}", status))
                } else {
                    body.clone()
                }
            }
            Self::UpstreamTimeout { timeout } => {
                serde_json::Value::String(format!("no upstream response within {:?}", timeout))
            }
            Self::Network { message } => serde_json::Value::String(message.clone()),
            Self::MissingLink { raw } => {
                if production {
                    serde_json::Value::String("no connect link in upstream response".to_string())
                } else {
                    raw.clone()
                }
            }
            Self::Internal { message } => serde_json::Value::String(message.clone()),
        }
    }
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Build an `Upstream` error from a non-success HTTP response.
///
/// The body is parsed as JSON when possible so the caller sees structured
/// upstream diagnostics; otherwise it is carried as opaque text. An empty
/// body still produces a usable `details` value; a 500 with no body helps
/// nobody debug an integration.
pub fn upstream_error_from_response(status: u16, body: &str) -> BrokerError {
    let body = parse_lenient(body, status);
    BrokerError::Upstream { status, body }
}

/// Parse a response body leniently: JSON if valid, opaque string otherwise.
pub fn parse_lenient(body: &str, status: u16) -> serde_json::Value {
    if body.is_empty() {
        return serde_json::Value::String(format!("HTTP {}", status));
    }
    serde_json::from_str(body)
        .unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}
