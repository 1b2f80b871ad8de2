//! Connection Session Broker
//!
//! Brokers third-party OAuth connection flows on behalf of end users:
//! given a caller-identified user and a target integration, it ensures the
//! user exists in the upstream connection broker, requests a scoped
//! connect session, and produces a redirect to the resulting consent
//! screen (or a diagnostic/token payload, depending on the variant).
//!
//! # Example
//!
//! ```rust,ignore
//! use connect_broker_integration::{broker_config, ConnectBroker, ConnectParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = broker_config()
//!         .secret_key(std::env::var("CONNECT_SECRET_KEY")?)
//!         .alias("mail", "google-mail-prod")
//!         .default_integration("hubspot")
//!         .build()?;
//!
//!     let broker = ConnectBroker::new(config)?;
//!
//!     let params = ConnectParams {
//!         provider: Some("mail".to_string()),
//!         end_user_id: Some("U1".to_string()),
//!         ..ConnectParams::default()
//!     };
//!
//!     // Hand status/headers/body to whatever HTTP layer embeds the broker.
//!     let response = broker.connect(params).await;
//!     println!("{} -> {:?}", response.status, response.header("location"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The pipeline is strictly sequential per call, with every deployment
//! drift point an explicit configuration option:
//!
//! - `types`: request/response data model and configuration
//! - `error`: error taxonomy with HTTP status mapping
//! - `core`: HTTP transport abstraction (reqwest impl + mock)
//! - `resolve`: pure slug-to-integration-key resolution
//! - `registrar`: idempotent end-user upsert (best-effort or strict)
//! - `session`: upstream connect-session creation
//! - `extract`: precedence-table link/token extraction
//! - `respond`: framework-neutral response emission
//! - `broker`: high-level client combining all stages

pub mod broker;
pub mod builders;
pub mod core;
pub mod error;
pub mod extract;
pub mod registrar;
pub mod resolve;
pub mod respond;
pub mod session;
pub mod types;

// Re-export main client
pub use broker::ConnectBroker;

// Re-export builders
pub use builders::{broker_config, BrokerConfigBuilder};

// Re-export errors
pub use error::{upstream_error_from_response, BrokerError, BrokerResult};

// Re-export types
pub use types::{
    BrokerConfig, BrokerCredentials, ConnectParams, ConnectionSessionRequest,
    ConnectionSessionResult, EndUserRef, IntegrationRef, NormalizedInput, RedirectStatus,
    RedirectTarget, RegistrarStrictness, SessionTokenIssued,
};

// Re-export core transport
pub use crate::core::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, ReqwestHttpTransport,
};

// Re-export stages
pub use extract::{extract_link, ExtractedLink};
pub use registrar::{EndUserRegistrar, MockRegistrar, UpstreamRegistrar};
pub use resolve::{resolve, resolve_ref, AliasTable};
pub use respond::{error_response, BrokerResponse, DebugReport};
pub use session::{MockSessionRequester, SessionRequester, UpstreamSessionRequester};
