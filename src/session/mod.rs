//! Session Requester
//!
//! Creates a connect session against the upstream broker, scoped to zero or
//! one integration. Never retried: without a client-supplied idempotency
//! key, a blind retry could mint duplicate sessions.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{parse_lenient, upstream_error_from_response, BrokerError, BrokerResult};
use crate::extract;
use crate::types::{BrokerConfig, ConnectionSessionRequest, ConnectionSessionResult, EndUserRef};

/// Wire body for the upstream session-creation call.
///
/// At most one scoping field is ever present: an exact config key wins
/// over an integration slug, and omitting both makes the upstream offer
/// its interactive picker.
#[derive(Serialize)]
struct SessionRequestBody<'a> {
    end_user: &'a EndUserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_connection_configs: Option<[&'a str; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_integrations: Option<[&'a str; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_redirect_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_redirect_url: Option<&'a str>,
}

impl<'a> SessionRequestBody<'a> {
    fn from_request(request: &'a ConnectionSessionRequest) -> Self {
        let config_scope = request.config_key.as_deref().map(|key| [key]);
        Self {
            end_user: &request.end_user,
            allowed_integrations: if config_scope.is_some() {
                None
            } else {
                request.resolved_key().map(|key| [key])
            },
            allowed_connection_configs: config_scope,
            success_redirect_url: request.success_redirect_url.as_deref(),
            failure_redirect_url: request.failure_redirect_url.as_deref(),
        }
    }
}

/// Session creation interface.
#[async_trait]
pub trait SessionRequester: Send + Sync {
    /// Create a connect session for the given request.
    async fn create_session(
        &self,
        request: &ConnectionSessionRequest,
    ) -> BrokerResult<ConnectionSessionResult>;
}

/// Session requester calling the upstream `POST /connect/sessions`.
pub struct UpstreamSessionRequester<T: HttpTransport> {
    config: BrokerConfig,
    transport: Arc<T>,
}

impl<T: HttpTransport> UpstreamSessionRequester<T> {
    /// Create new session requester.
    pub fn new(config: BrokerConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    /// Wire body as a JSON value, for the debug diagnostic response.
    pub fn body_json(request: &ConnectionSessionRequest) -> serde_json::Value {
        serde_json::to_value(SessionRequestBody::from_request(request))
            .unwrap_or(serde_json::Value::Null)
    }

    fn build_request(&self, request: &ConnectionSessionRequest) -> BrokerResult<HttpRequest> {
        let body = SessionRequestBody::from_request(request);
        let body = serde_json::to_string(&body).map_err(|e| BrokerError::Internal {
            message: format!("failed to encode session body: {}", e),
        })?;

        let mut headers = HashMap::new();
        headers.insert(
            "authorization".to_string(),
            self.config.credentials.bearer_header(),
        );
        headers.insert("content-type".to_string(), "application/json".to_string());

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.config.sessions_endpoint(),
            headers,
            body: Some(body),
            timeout: Some(self.config.timeout),
        })
    }
}

#[async_trait]
impl<T: HttpTransport> SessionRequester for UpstreamSessionRequester<T> {
    async fn create_session(
        &self,
        request: &ConnectionSessionRequest,
    ) -> BrokerResult<ConnectionSessionResult> {
        let http_request = self.build_request(request)?;
        let response = self.transport.send(http_request).await?;

        // The body is read in full on every status; upstream diagnostics
        // travel with the error instead of turning into a silent 500.
        if !response.is_success() {
            return Err(upstream_error_from_response(response.status, &response.body));
        }

        let raw = parse_lenient(&response.body, response.status);

        Ok(ConnectionSessionResult {
            token: extract::probe_token(&raw),
            connect_link: extract::probe_link(&raw),
            raw,
        })
    }
}

/// Mock session requester for testing.
#[derive(Default)]
pub struct MockSessionRequester {
    request_history: std::sync::Mutex<Vec<ConnectionSessionRequest>>,
    next_result: std::sync::Mutex<Option<ConnectionSessionResult>>,
    next_error: std::sync::Mutex<Option<BrokerError>>,
}

impl MockSessionRequester {
    /// Create new mock requester.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set next session result.
    pub fn set_next_result(&self, result: ConnectionSessionResult) -> &Self {
        *self.next_result.lock().unwrap() = Some(result);
        self
    }

    /// Fail the next call with the given error.
    pub fn set_next_error(&self, error: BrokerError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<ConnectionSessionRequest> {
        self.request_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionRequester for MockSessionRequester {
    async fn create_session(
        &self,
        request: &ConnectionSessionRequest,
    ) -> BrokerResult<ConnectionSessionResult> {
        self.request_history.lock().unwrap().push(request.clone());

        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        if let Some(result) = self.next_result.lock().unwrap().take() {
            return Ok(result);
        }

        let raw = serde_json::json!({"token": "mock-session-token"});
        Ok(ConnectionSessionResult {
            token: Some("mock-session-token".to_string()),
            connect_link: None,
            raw,
        })
    }
}
