//! HTTP Transport
//!
//! HTTP client interface and implementations for upstream broker calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::BrokerError;

/// HTTP request definition.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// HTTP response definition.
///
/// The body is always fully read, on error statuses too; the upstream's
/// diagnostic payload must reach the caller.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Check for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BrokerError>;
}

/// Default reqwest-based HTTP transport.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl ReqwestHttpTransport {
    /// Create new transport with the default 10s timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Create transport with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        // Upstream redirects are never followed: a 3xx from the broker API
        // is a protocol anomaly, not a navigation target.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            default_timeout: timeout,
        }
    }
}

impl Default for ReqwestHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BrokerError> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                BrokerError::UpstreamTimeout { timeout }
            } else {
                BrokerError::Network {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string().to_lowercase(), v.to_string());
            }
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                BrokerError::UpstreamTimeout { timeout }
            } else {
                BrokerError::Network {
                    message: e.to_string(),
                }
            }
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Mock HTTP transport for testing.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: std::sync::Mutex<Vec<HttpResponse>>,
    request_history: std::sync::Mutex<Vec<HttpRequest>>,
    next_error: std::sync::Mutex<Option<BrokerError>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return (FIFO).
    pub fn queue_response(&self, response: HttpResponse) -> &Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response<T: serde::Serialize>(&self, status: u16, body: &T) -> &Self {
        let response = HttpResponse {
            status,
            headers: [("content-type".to_string(), "application/json".to_string())]
                .into_iter()
                .collect(),
            body: serde_json::to_string(body).unwrap(),
        };
        self.queue_response(response)
    }

    /// Fail the next request with the given error.
    pub fn set_next_error(&self, error: BrokerError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.request_history.lock().unwrap().clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<HttpRequest> {
        self.request_history.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BrokerError> {
        self.request_history.lock().unwrap().push(request);

        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(BrokerError::Network {
                message: "No mock response available".to_string(),
            });
        }
        Ok(responses.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockHttpTransport::new();
        transport.queue_json_response(200, &serde_json::json!({"token": "abc"}));

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: "https://api.example.dev/connect/sessions".to_string(),
            headers: HashMap::new(),
            body: Some("{}".to_string()),
            timeout: None,
        };

        let response = transport.send(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert!(response.body.contains("abc"));

        let history = transport.get_requests();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].method, HttpMethod::Post);
    }

    #[tokio::test]
    async fn test_mock_transport_responses_are_fifo() {
        let transport = MockHttpTransport::new();
        transport.queue_json_response(201, &serde_json::json!({"first": true}));
        transport.queue_json_response(200, &serde_json::json!({"second": true}));

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: "https://api.example.dev/users".to_string(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        };

        let first = transport.send(request.clone()).await.unwrap();
        assert_eq!(first.status, 201);
        let second = transport.send(request).await.unwrap();
        assert_eq!(second.status, 200);
    }

    #[tokio::test]
    async fn test_mock_transport_empty_queue_is_error() {
        let transport = MockHttpTransport::new();
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "https://api.example.dev".to_string(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        };
        assert!(transport.send(request).await.is_err());
    }
}
