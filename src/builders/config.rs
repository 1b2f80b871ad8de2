//! Configuration Builder
//!
//! Fluent builder for broker configuration.

use std::time::Duration;

use crate::error::{BrokerError, BrokerResult};
use crate::resolve::AliasTable;
use crate::types::{
    BrokerConfig, BrokerCredentials, RedirectStatus, RegistrarStrictness, DEFAULT_API_BASE,
    DEFAULT_FAILURE_PATH, DEFAULT_LINK_TEMPLATE, DEFAULT_TIMEOUT,
};

/// Broker configuration builder.
pub struct BrokerConfigBuilder {
    base_url: String,
    secret_key: Option<String>,
    alias_table: AliasTable,
    default_integration: Option<String>,
    link_template: String,
    redirect_status: RedirectStatus,
    registrar_strictness: RegistrarStrictness,
    ensure_user: bool,
    auto_generate_end_user_id: bool,
    timeout: Duration,
    production: bool,
    failure_path: String,
}

impl Default for BrokerConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            secret_key: None,
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
}

impl BrokerConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upstream API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the upstream secret key.
    pub fn secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Add one slug alias.
    pub fn alias(mut self, from: impl AsRef<str>, to: impl Into<String>) -> Self {
        self.alias_table = self.alias_table.alias(from, to);
        self
    }

    /// Replace the whole alias table.
    pub fn alias_table(mut self, table: AliasTable) -> Self {
        self.alias_table = table;
        self
    }

    /// Set the integration key used when the caller names none.
    pub fn default_integration(mut self, key: impl Into<String>) -> Self {
        self.default_integration = Some(key.into());
        self
    }

    /// Set the token-to-link synthesis template (`{token}` placeholder).
    pub fn link_template(mut self, template: impl Into<String>) -> Self {
        self.link_template = template.into();
        self
    }

    /// Set the redirect status for this deployment.
    pub fn redirect_status(mut self, status: RedirectStatus) -> Self {
        self.redirect_status = status;
        self
    }

    /// Set the registrar failure policy.
    pub fn registrar_strictness(mut self, strictness: RegistrarStrictness) -> Self {
        self.registrar_strictness = strictness;
        self
    }

    /// Enable or disable the pre-session user upsert.
    pub fn ensure_user(mut self, ensure: bool) -> Self {
        self.ensure_user = ensure;
        self
    }

    /// Enable or disable anonymous end-user id generation.
    pub fn auto_generate_end_user_id(mut self, enable: bool) -> Self {
        self.auto_generate_end_user_id = enable;
        self
    }

    /// Set the upstream call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable production redaction of upstream payloads.
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Set the failure-redirect path appended to the return URL origin.
    pub fn failure_path(mut self, path: impl Into<String>) -> Self {
        self.failure_path = path.into();
        self
    }

    /// Build the broker configuration.
    pub fn build(self) -> BrokerResult<BrokerConfig> {
        let secret_key = self
            .secret_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BrokerError::MissingCredential {
                field: "secret_key".to_string(),
            })?;

        Ok(BrokerConfig {
            base_url: self.base_url,
            credentials: BrokerCredentials::new(secret_key),
            alias_table: self.alias_table,
            default_integration: self.default_integration,
            link_template: self.link_template,
            redirect_status: self.redirect_status,
            registrar_strictness: self.registrar_strictness,
            ensure_user: self.ensure_user,
            auto_generate_end_user_id: self.auto_generate_end_user_id,
            timeout: self.timeout,
            production: self.production,
            failure_path: self.failure_path,
        })
    }
}

/// Create a new broker configuration builder.
pub fn broker_config() -> BrokerConfigBuilder {
    BrokerConfigBuilder::new()
}
