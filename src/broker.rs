//! Connect Broker
//!
//! High-level client driving the whole pipeline: normalize the inbound
//! parameters, resolve the integration, ensure the end user exists
//! upstream, create the session, extract the consent link, and emit the
//! response. Every failure is mapped to a structured error response; no
//! stage lets an error propagate unhandled to the embedding HTTP layer.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::{BrokerError, BrokerResult};
use crate::extract::{self, ExtractedLink};
use crate::registrar::{EndUserRegistrar, UpstreamRegistrar};
use crate::resolve;
use crate::respond::{self, BrokerResponse, DebugReport};
use crate::session::{SessionRequester, UpstreamSessionRequester};
use crate::types::{
    BrokerConfig, ConnectParams, ConnectionSessionRequest, ConnectionSessionResult,
    RedirectTarget, RegistrarStrictness, SessionTokenIssued,
};

/// Connection session broker.
///
/// Holds the immutable configuration and a shared transport; each call is
/// handled independently with no state carried between calls.
pub struct ConnectBroker<T: HttpTransport = ReqwestHttpTransport> {
    config: BrokerConfig,
    transport: Arc<T>,
}

impl ConnectBroker<ReqwestHttpTransport> {
    /// Create a broker with the default reqwest transport.
    ///
    /// Fails with `MISSING_CREDENTIAL` when the secret is not provisioned;
    /// configuration errors surface at construction, before any caller
    /// traffic.
    pub fn new(config: BrokerConfig) -> BrokerResult<Self> {
        let transport = ReqwestHttpTransport::with_timeout(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: HttpTransport> ConnectBroker<T> {
    /// Create a broker with a custom transport.
    pub fn with_transport(config: BrokerConfig, transport: T) -> BrokerResult<Self> {
        if !config.credentials.is_provisioned() {
            return Err(BrokerError::MissingCredential {
                field: "secret_key".to_string(),
            });
        }
        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    /// Get the broker configuration.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Handle the session-initiation (GET redirect) flow.
    ///
    /// Responds with a redirect to the consent screen, or the diagnostic
    /// JSON body when the caller set the debug flag.
    pub async fn connect(&self, params: ConnectParams) -> BrokerResponse {
        match self.run_connect(params).await {
            Ok(response) => response,
            Err(error) => {
                warn!(code = error.error_code(), error = %error, "connect flow failed");
                respond::error_response(&error, self.config.production)
            }
        }
    }

    /// Handle the token-issuance (POST) variant: same pipeline, but the
    /// session token is returned as JSON instead of redirecting.
    pub async fn issue_session_token(&self, params: ConnectParams) -> BrokerResponse {
        match self.run_issue_token(params).await {
            Ok(response) => response,
            Err(error) => {
                warn!(code = error.error_code(), error = %error, "token issuance failed");
                respond::error_response(&error, self.config.production)
            }
        }
    }

    async fn run_connect(&self, params: ConnectParams) -> BrokerResult<BrokerResponse> {
        let outcome = self.run_pipeline(&params).await?;

        if outcome.debug {
            return Ok(respond::debug_report(&outcome.debug_report(&self.config)));
        }

        Ok(respond::redirect(&RedirectTarget {
            url: outcome.extracted.link.clone(),
            status: self.config.redirect_status,
        }))
    }

    async fn run_issue_token(&self, params: ConnectParams) -> BrokerResult<BrokerResponse> {
        let outcome = self.run_pipeline(&params).await?;

        // This variant exists to hand a token to an embedding front-end;
        // a link-only upstream response cannot satisfy it.
        let session_token = outcome.extracted.token.clone().ok_or_else(|| {
            BrokerError::MissingLink {
                raw: outcome.result.raw.clone(),
            }
        })?;

        Ok(respond::token_issued(&SessionTokenIssued {
            session_token,
            connect_link: Some(outcome.extracted.link.clone()),
            end_user_id: outcome.request.end_user.id.clone(),
            provider: outcome.request.resolved_key().map(str::to_string),
        }))
    }

    /// Run the shared stage sequence up to link extraction.
    ///
    /// Strictly sequential; the only suspension points are the two
    /// upstream calls, both bounded by the configured timeout.
    async fn run_pipeline(&self, params: &ConnectParams) -> BrokerResult<PipelineOutcome> {
        let input = params.normalize(&self.config)?;

        let scope = resolve::resolve_ref(
            &input.slug,
            &self.config.alias_table,
            self.config.default_integration.as_deref(),
        );
        debug!(
            slug = %input.slug,
            resolved = scope.resolved_key.as_deref().unwrap_or("<picker>"),
            end_user_id = %input.end_user.id,
            "resolved integration scope"
        );

        let request = ConnectionSessionRequest {
            end_user: input.end_user,
            scope: scope.resolved_key.is_some().then_some(scope),
            config_key: input.config_key,
            success_redirect_url: input.success_redirect_url,
            failure_redirect_url: input.failure_redirect_url,
        };

        if self.config.ensure_user {
            let registrar = UpstreamRegistrar::new(self.config.clone(), self.transport.clone());
            if let Err(error) = registrar.ensure_user(&request.end_user).await {
                match self.config.registrar_strictness {
                    RegistrarStrictness::Strict => return Err(error),
                    RegistrarStrictness::BestEffort => {
                        // Session creation succeeds or fails on its own;
                        // surfacing both errors would confuse the caller.
                        warn!(
                            end_user_id = %request.end_user.id,
                            error = %error,
                            "user upsert failed, continuing to session creation"
                        );
                    }
                }
            }
        }

        let requester = UpstreamSessionRequester::new(self.config.clone(), self.transport.clone());
        let result = requester.create_session(&request).await?;

        let extracted = extract::extract_link(&result.raw, &self.config.link_template)?;
        debug!(source = extracted.source, "extracted consent link");

        Ok(PipelineOutcome {
            slug: input.slug,
            debug: input.debug,
            request,
            result,
            extracted,
        })
    }
}

/// Everything the shared pipeline produced, for the emitters to render.
struct PipelineOutcome {
    slug: String,
    debug: bool,
    request: ConnectionSessionRequest,
    result: ConnectionSessionResult,
    extracted: ExtractedLink,
}

impl PipelineOutcome {
    fn debug_report(&self, config: &BrokerConfig) -> DebugReport {
        DebugReport {
            provider_slug: self.slug.clone(),
            resolved_key: self.request.resolved_key().map(str::to_string),
            end_user_id: self.request.end_user.id.clone(),
            upstream_request: serde_json::json!({
                "method": "POST",
                "url": config.sessions_endpoint(),
                "headers": {
                    "authorization": "Bearer [REDACTED]",
                    "content-type": "application/json",
                },
                "body": UpstreamSessionRequester::<ReqwestHttpTransport>::body_json(&self.request),
            }),
            upstream_response: self.result.raw.clone(),
            oauth_connect_url: self.extracted.link.clone(),
        }
    }
}
