//! Inbound Parameters
//!
//! Raw caller-supplied parameters and their normalization into a validated
//! session-request seed. All sanitization lives here: external UIs paste
//! slugs with stray whitespace (including non-breaking spaces), and the
//! first click after a copy-paste must not fail on them.

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::collections::BTreeMap;
use url::Url;

use crate::error::{BrokerError, BrokerResult};

use super::config::BrokerConfig;
use super::end_user::EndUserRef;

/// Tokens accepted as "true" for the debug flag.
const TRUTHY_TOKENS: [&str; 4] = ["1", "true", "yes", "on"];

/// Raw inbound request parameters, prior to validation.
#[derive(Clone, Debug, Default)]
pub struct ConnectParams {
    /// Integration slug (`provider`/`integration` query parameter).
    pub provider: Option<String>,
    /// Exact provider config key (`config` query parameter). When present
    /// it scopes the session directly and the integration slug is ignored.
    pub config: Option<String>,
    /// End-user identifier.
    pub end_user_id: Option<String>,
    /// Optional email passthrough.
    pub email: Option<String>,
    /// Optional display name passthrough.
    pub display_name: Option<String>,
    /// Optional tags passthrough.
    pub tags: Option<BTreeMap<String, serde_json::Value>>,
    /// Caller's own success page (absolute URL).
    pub return_url: Option<String>,
    /// Raw debug flag token.
    pub debug: Option<String>,
}

impl ConnectParams {
    /// Parameters carrying only an end-user id.
    pub fn for_end_user(id: impl Into<String>) -> Self {
        Self {
            end_user_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Parse the debug flag from its enumerated truthy token set.
    pub fn is_debug(&self) -> bool {
        self.debug
            .as_deref()
            .map(|v| TRUTHY_TOKENS.contains(&v.trim().to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Validate and normalize into a session-request seed.
    ///
    /// Hard failure when the end-user id is missing, unless the deployment
    /// enables anonymous id generation. The debug flag never bypasses
    /// validation.
    pub fn normalize(&self, config: &BrokerConfig) -> BrokerResult<NormalizedInput> {
        let slug = sanitize_slug(self.provider.as_deref().unwrap_or(""));
        let config_key =
            Some(sanitize_slug(self.config.as_deref().unwrap_or(""))).filter(|k| !k.is_empty());

        let id = match non_empty(self.end_user_id.as_deref()) {
            Some(id) => id,
            None if config.auto_generate_end_user_id => generate_end_user_id(),
            None => {
                return Err(BrokerError::Validation {
                    message: "MISSING_END_USER: endUserId is required".to_string(),
                })
            }
        };

        let (success_redirect_url, failure_redirect_url) =
            match non_empty(self.return_url.as_deref()) {
                Some(return_url) => {
                    let parsed = Url::parse(&return_url).map_err(|_| BrokerError::Validation {
                        message: format!("returnUrl is not an absolute URL: {}", return_url),
                    })?;
                    // Opaque origins (mailto:, data:) serialize as "null"
                    // and would produce a garbage failure URL.
                    let origin = parsed.origin();
                    if !origin.is_tuple() {
                        return Err(BrokerError::Validation {
                            message: format!("returnUrl has no usable origin: {}", return_url),
                        });
                    }
                    let failure =
                        format!("{}{}", origin.ascii_serialization(), config.failure_path);
                    (Some(return_url), Some(failure))
                }
                None => (None, None),
            };

        let end_user = EndUserRef {
            id,
            email: non_empty(self.email.as_deref()),
            display_name: non_empty(self.display_name.as_deref()),
            tags: self.tags.clone().filter(|t| !t.is_empty()),
        };

        Ok(NormalizedInput {
            slug,
            config_key,
            end_user,
            success_redirect_url,
            failure_redirect_url,
            debug: self.is_debug(),
        })
    }
}

/// Validated seed produced by [`ConnectParams::normalize`].
#[derive(Clone, Debug)]
pub struct NormalizedInput {
    /// Sanitized integration slug (possibly empty).
    pub slug: String,
    /// Sanitized exact provider config key, if the caller supplied one.
    pub config_key: Option<String>,
    /// Validated end-user reference.
    pub end_user: EndUserRef,
    /// Caller's success page, if any.
    pub success_redirect_url: Option<String>,
    /// Failure page derived from the success page's origin.
    pub failure_redirect_url: Option<String>,
    /// Whether the caller asked for the diagnostic response.
    pub debug: bool,
}

/// Strip all whitespace (non-breaking space included) and lower-case.
pub fn sanitize_slug(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Trim and drop empty strings so optional passthroughs never pollute the
/// upstream body with `""`.
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Mint an anonymous end-user id: `anon_<unix-millis>_<6 alphanumerics>`.
fn generate_end_user_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("anon_{}_{}", Utc::now().timestamp_millis(), suffix)
}
