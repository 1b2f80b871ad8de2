//! End-to-end tests for the connect broker against a mock upstream.

use std::time::Duration;

use connect_broker_integration::{
    broker_config, BrokerConfig, ConnectBroker, ConnectParams, RedirectStatus,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> BrokerConfig {
    broker_config()
        .base_url(server.uri())
        .secret_key("sk-e2e-test")
        .alias("acme-mail", "google-mail-prod")
        .link_template("https://connect.example.dev?session_token={token}")
        .build()
        .expect("config should build")
}

async fn mount_user_upsert(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("authorization", "Bearer sk-e2e-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scenario_a_alias_scoped_session_redirects() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .and(header("authorization", "Bearer sk-e2e-test"))
        .and(body_partial_json(json!({
            "end_user": {"id": "U1"},
            "allowed_integrations": ["google-mail-prod"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"connect_link": "https://c.dev/consent/abc"}
        })))
        .mount(&server)
        .await;

    let broker = ConnectBroker::new(config_for(&server)).unwrap();
    let params = ConnectParams {
        provider: Some("acme-mail".to_string()),
        end_user_id: Some("U1".to_string()),
        ..ConnectParams::default()
    };

    let response = broker.connect(params).await;
    assert_eq!(response.status, 302);
    assert_eq!(
        response.header("location"),
        Some("https://c.dev/consent/abc")
    );
    assert!(response
        .header("cache-control")
        .unwrap()
        .contains("no-store"));
}

#[tokio::test]
async fn test_scenario_b_picker_session_synthesizes_link_from_token() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok_b"})))
        .mount(&server)
        .await;

    let broker = ConnectBroker::new(config_for(&server)).unwrap();
    let response = broker.connect(ConnectParams::for_end_user("U2")).await;

    assert_eq!(response.status, 302);
    assert_eq!(
        response.header("location"),
        Some("https://connect.example.dev?session_token=tok_b")
    );

    // Picker mode: the session body carries no scoping field.
    let session_calls: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/connect/sessions")
        .collect();
    assert_eq!(session_calls.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&session_calls[0].body).unwrap();
    assert!(body.get("allowed_integrations").is_none());
    assert_eq!(body["end_user"]["id"], "U2");
}

#[tokio::test]
async fn test_scenario_c_debug_returns_diagnostic_json() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"connect_link": "https://c.dev/consent/dbg"}
        })))
        .mount(&server)
        .await;

    let broker = ConnectBroker::new(config_for(&server)).unwrap();
    let params = ConnectParams {
        provider: Some("acme-mail".to_string()),
        end_user_id: Some("U1".to_string()),
        debug: Some("1".to_string()),
        ..ConnectParams::default()
    };

    let response = broker.connect(params).await;
    assert_eq!(response.status, 200);
    assert!(response.header("location").is_none());

    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["oauth_connect_url"], "https://c.dev/consent/dbg");
    assert_eq!(body["resolved_key"], "google-mail-prod");
    assert_eq!(body["end_user_id"], "U1");
    // The credential never leaks into the diagnostic.
    assert!(!response.body.contains("sk-e2e-test"));
}

#[tokio::test]
async fn test_missing_end_user_id_fails_before_any_upstream_call() {
    let server = MockServer::start().await;
    let broker = ConnectBroker::new(config_for(&server)).unwrap();

    let response = broker.connect(ConnectParams::default()).await;
    assert_eq!(response.status, 400);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["error"], "VALIDATION_ERROR");

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_404_surfaces_as_502_with_raw_body() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "unknown integration"})),
        )
        .mount(&server)
        .await;

    let broker = ConnectBroker::new(config_for(&server)).unwrap();
    let params = ConnectParams {
        provider: Some("no-such-thing".to_string()),
        end_user_id: Some("U1".to_string()),
        ..ConnectParams::default()
    };

    let response = broker.connect(params).await;
    assert_eq!(response.status, 502);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["error"], "UPSTREAM_ERROR");
    assert_eq!(body["details"]["error"], "unknown integration");
}

#[tokio::test]
async fn test_production_mode_redacts_upstream_body() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"internal": "stack trace"})))
        .mount(&server)
        .await;

    let config = broker_config()
        .base_url(server.uri())
        .secret_key("sk-e2e-test")
        .production(true)
        .build()
        .unwrap();
    let broker = ConnectBroker::new(config).unwrap();

    let response = broker.connect(ConnectParams::for_end_user("U1")).await;
    assert_eq!(response.status, 502);
    // The upstream payload must not leak through in production mode.
    assert!(!response.body.contains("internal"));
    assert!(!response.body.contains("stack trace"));
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["details"], "upstream HTTP 500");
}

#[tokio::test]
async fn test_registrar_outage_is_best_effort() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upsert down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok_r"})))
        .mount(&server)
        .await;

    let broker = ConnectBroker::new(config_for(&server)).unwrap();
    let response = broker.connect(ConnectParams::for_end_user("U1")).await;

    assert_eq!(response.status, 302);
    assert_eq!(
        response.header("location"),
        Some("https://connect.example.dev?session_token=tok_r")
    );
}

#[tokio::test]
async fn test_session_without_link_or_token_is_missing_link() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "created"})))
        .mount(&server)
        .await;

    let broker = ConnectBroker::new(config_for(&server)).unwrap();
    let response = broker.connect(ConnectParams::for_end_user("U1")).await;

    assert_eq!(response.status, 502);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["error"], "MISSING_LINK");
    assert_eq!(body["details"]["status"], "created");
}

#[tokio::test]
async fn test_token_issuance_variant_returns_json() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "tok_p"}})))
        .mount(&server)
        .await;

    let broker = ConnectBroker::new(config_for(&server)).unwrap();
    let params = ConnectParams {
        provider: Some("hubspot".to_string()),
        end_user_id: Some("U9".to_string()),
        ..ConnectParams::default()
    };

    let response = broker.issue_session_token(params).await;
    assert_eq!(response.status, 200);
    assert!(response.header("location").is_none());

    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["sessionToken"], "tok_p");
    assert_eq!(body["endUserId"], "U9");
    assert_eq!(body["provider"], "hubspot");
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = broker_config()
        .base_url(server.uri())
        .secret_key("sk-e2e-test")
        .timeout(Duration::from_millis(250))
        .build()
        .unwrap();
    let broker = ConnectBroker::new(config).unwrap();

    let response = broker.connect(ConnectParams::for_end_user("U1")).await;
    assert_eq!(response.status, 504);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["error"], "UPSTREAM_TIMEOUT");
}

#[tokio::test]
async fn test_307_deployment_preserves_method_semantics() {
    let server = MockServer::start().await;
    mount_user_upsert(&server).await;

    Mock::given(method("POST"))
        .and(path("/connect/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok_m"})))
        .mount(&server)
        .await;

    let config = broker_config()
        .base_url(server.uri())
        .secret_key("sk-e2e-test")
        .link_template("https://connect.example.dev?session_token={token}")
        .redirect_status(RedirectStatus::TemporaryRedirect)
        .build()
        .unwrap();
    let broker = ConnectBroker::new(config).unwrap();

    let response = broker.connect(ConnectParams::for_end_user("U1")).await;
    assert_eq!(response.status, 307);
    assert!(response.header("location").is_some());
}
