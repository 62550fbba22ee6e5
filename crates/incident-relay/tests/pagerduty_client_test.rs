//! `PagerDutyClient` tests against a mock Events API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use incident_relay::{IncidentApi, IncidentRequest, PagerDutyClient, Severity};

fn client(server: &MockServer) -> PagerDutyClient {
    PagerDutyClient::new(format!("{}/v2/enqueue", server.uri()), Duration::from_secs(5)).unwrap()
}

fn request() -> IncidentRequest {
    IncidentRequest::trigger("routing-key", "disk full", Severity::Critical, "prod-db").unwrap()
}

#[tokio::test]
async fn test_posts_trigger_and_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/enqueue"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "routing_key": "routing-key",
            "event_action": "trigger",
            "payload": {
                "summary": "disk full",
                "severity": "critical",
                "source": "prod-db"
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "status": "success",
            "message": "Event processed",
            "dedup_key": "5ac64822f2e84a1b"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server).create_event(&request()).await.unwrap();

    assert_eq!(response.dedup_key(), Some("5ac64822f2e84a1b"));
    assert_eq!(response.0["status"], "success");
}

#[tokio::test]
async fn test_error_status_and_body_are_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/enqueue"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid routing key"))
        .mount(&server)
        .await;

    let failure = client(&server).create_event(&request()).await.unwrap_err();

    assert_eq!(failure.status, Some(400));
    assert_eq!(failure.message, "Invalid routing key");
}

#[tokio::test]
async fn test_undecodable_success_body_has_no_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_string("not json"))
        .mount(&server)
        .await;

    let failure = client(&server).create_event(&request()).await.unwrap_err();

    assert_eq!(failure.status, None);
}

#[tokio::test]
async fn test_connection_failure_has_no_status() {
    // Bind then release a port so nothing is listening on it.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{port}/v2/enqueue");

    let client = PagerDutyClient::new(url, Duration::from_secs(2)).unwrap();
    let failure = client.create_event(&request()).await.unwrap_err();

    assert_eq!(failure.status, None);
    assert!(!failure.message.is_empty());
}
