//! End-User Registrar
//!
//! Idempotent upsert of the end user into the upstream broker before a
//! session is requested. The upsert carries no state beyond the user record
//! itself, so it is safe to repeat on every request and to retry once on a
//! transient network failure.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{upstream_error_from_response, BrokerError, BrokerResult};
use crate::types::{BrokerConfig, EndUserRef};

/// End-user registration interface.
#[async_trait]
pub trait EndUserRegistrar: Send + Sync {
    /// Ensure the end user exists upstream (create-or-update).
    async fn ensure_user(&self, end_user: &EndUserRef) -> BrokerResult<()>;
}

/// Registrar calling the upstream `POST /users` upsert.
pub struct UpstreamRegistrar<T: HttpTransport> {
    config: BrokerConfig,
    transport: Arc<T>,
}

impl<T: HttpTransport> UpstreamRegistrar<T> {
    /// Create new registrar.
    pub fn new(config: BrokerConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    fn build_request(&self, end_user: &EndUserRef) -> BrokerResult<HttpRequest> {
        let body = serde_json::to_string(end_user).map_err(|e| BrokerError::Internal {
            message: format!("failed to encode user upsert body: {}", e),
        })?;

        let mut headers = HashMap::new();
        headers.insert(
            "authorization".to_string(),
            self.config.credentials.bearer_header(),
        );
        headers.insert("content-type".to_string(), "application/json".to_string());

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.config.users_endpoint(),
            headers,
            body: Some(body),
            timeout: Some(self.config.timeout),
        })
    }

    async fn send_upsert(&self, end_user: &EndUserRef) -> BrokerResult<()> {
        let request = self.build_request(end_user)?;
        let response = self.transport.send(request).await?;

        // Any 2xx counts as a successful upsert.
        if !response.is_success() {
            return Err(upstream_error_from_response(response.status, &response.body));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: HttpTransport> EndUserRegistrar for UpstreamRegistrar<T> {
    async fn ensure_user(&self, end_user: &EndUserRef) -> BrokerResult<()> {
        match self.send_upsert(end_user).await {
            Ok(()) => Ok(()),
            // Idempotent, so one retry on a transient failure is safe.
            // Upstream HTTP errors are not transient and are not retried.
            Err(error) if error.is_retryable() => {
                debug!(
                    end_user_id = %end_user.id,
                    error = %error,
                    "user upsert hit transient failure, retrying once"
                );
                self.send_upsert(end_user).await
            }
            Err(error) => Err(error),
        }
    }
}

/// Mock registrar for testing.
#[derive(Default)]
pub struct MockRegistrar {
    call_history: std::sync::Mutex<Vec<EndUserRef>>,
    next_error: std::sync::Mutex<Option<BrokerError>>,
}

impl MockRegistrar {
    /// Create new mock registrar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call with the given error.
    pub fn set_next_error(&self, error: BrokerError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Get call history.
    pub fn get_calls(&self) -> Vec<EndUserRef> {
        self.call_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl EndUserRegistrar for MockRegistrar {
    async fn ensure_user(&self, end_user: &EndUserRef) -> BrokerResult<()> {
        self.call_history.lock().unwrap().push(end_user.clone());
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(())
    }
}
