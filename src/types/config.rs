//! Configuration Types
//!
//! Immutable broker configuration, fixed at construction time. Every
//! deployment drift point (alias table, default integration, redirect
//! status, registrar strictness, id auto-generation) is an explicit option
//! here rather than a forked code path.

use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;

use crate::error::{BrokerError, BrokerResult};
use crate::resolve::AliasTable;

use super::redirect::RedirectStatus;

/// Environment variable names for broker configuration.
pub const CONNECT_SECRET_KEY: &str = "CONNECT_SECRET_KEY";
pub const CONNECT_API_BASE: &str = "CONNECT_API_BASE";
pub const CONNECT_DEFAULT_INTEGRATION: &str = "CONNECT_DEFAULT_INTEGRATION";

/// Default upstream API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.nango.dev";

/// Default template used to synthesize a consent link from a bare session
/// token. `{token}` is substituted with the extracted token.
pub const DEFAULT_LINK_TEMPLATE: &str = "https://connect.nango.dev?session_token={token}";

/// Default path (relative to the caller's return URL origin) the upstream
/// sends the browser to when the consent flow fails.
pub const DEFAULT_FAILURE_PATH: &str = "/connect/failure";

/// Default bound on each upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How end-user registration failures are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrarStrictness {
    /// Log the failure and continue to session creation. Session creation
    /// succeeds or fails on its own; surfacing both errors would confuse
    /// the caller.
    BestEffort,
    /// Fail the whole request on registration failure.
    Strict,
}

impl Default for RegistrarStrictness {
    fn default() -> Self {
        Self::BestEffort
    }
}

/// Server-side credential for the upstream broker API.
///
/// Transmitted only as a bearer token upstream; never exposed to the
/// caller or browser.
#[derive(Clone)]
pub struct BrokerCredentials {
    /// Upstream secret key.
    pub secret_key: SecretString,
}

impl BrokerCredentials {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::new(secret_key.into()),
        }
    }

    /// Check the secret is actually provisioned.
    pub fn is_provisioned(&self) -> bool {
        !self.secret_key.expose_secret().is_empty()
    }

    /// Authorization header value for upstream calls.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.secret_key.expose_secret())
    }
}

impl std::fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Broker configuration.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Upstream API base URL.
    pub base_url: String,
    /// Upstream credential.
    pub credentials: BrokerCredentials,
    /// Alias table mapping deprecated/ambiguous slugs to canonical keys.
    pub alias_table: AliasTable,
    /// Integration key used when the caller names none.
    pub default_integration: Option<String>,
    /// Template for synthesizing a consent link from a session token.
    pub link_template: String,
    /// Redirect status code for this deployment.
    pub redirect_status: RedirectStatus,
    /// Policy for end-user registration failures.
    pub registrar_strictness: RegistrarStrictness,
    /// Ensure the end user exists upstream before requesting a session.
    pub ensure_user: bool,
    /// Mint an anonymous end-user id when the caller supplies none.
    pub auto_generate_end_user_id: bool,
    /// Bound on each upstream call.
    pub timeout: Duration,
    /// Redact upstream payloads from error responses.
    pub production: bool,
    /// Failure-redirect path appended to the caller's return URL origin.
    pub failure_path: String,
}

impl BrokerConfig {
    /// Minimal configuration with defaults for every drift point.
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: BrokerCredentials::new(secret_key),
            alias_table: AliasTable::default(),
            default_integration: None,
            link_template: DEFAULT_LINK_TEMPLATE.to_string(),
            redirect_status: RedirectStatus::default(),
            registrar_strictness: RegistrarStrictness::default(),
            ensure_user: true,
            auto_generate_end_user_id: false,
            timeout: DEFAULT_TIMEOUT,
            production: false,
            failure_path: DEFAULT_FAILURE_PATH.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `CONNECT_SECRET_KEY` is required; `CONNECT_API_BASE` and
    /// `CONNECT_DEFAULT_INTEGRATION` are optional.
    pub fn from_env() -> BrokerResult<Self> {
        let secret_key = env::var(CONNECT_SECRET_KEY).map_err(|_| {
            BrokerError::MissingCredential {
                field: CONNECT_SECRET_KEY.to_string(),
            }
        })?;
        if secret_key.is_empty() {
            return Err(BrokerError::MissingCredential {
                field: CONNECT_SECRET_KEY.to_string(),
            });
        }

        let base_url = env::var(CONNECT_API_BASE)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let mut config = Self::new(base_url, secret_key);
        config.default_integration = env::var(CONNECT_DEFAULT_INTEGRATION)
            .ok()
            .filter(|v| !v.is_empty());
        Ok(config)
    }

    /// Upstream endpoint for the idempotent user upsert.
    pub fn users_endpoint(&self) -> String {
        format!("{}/users", self.base_url.trim_end_matches('/'))
    }

    /// Upstream endpoint for connect-session creation.
    pub fn sessions_endpoint(&self) -> String {
        format!("{}/connect/sessions", self.base_url.trim_end_matches('/'))
    }
}
