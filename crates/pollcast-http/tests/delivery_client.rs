//! Integration tests for HttpDeliveryClient.
//!
//! Uses wiremock as the subscriber endpoint. Covers headers, status handling
//! (2xx/3xx/5xx all count as delivered), and transport failures.

use std::time::Duration;

use base64::Engine as _;
use pollcast_core::{DeliveryClient, DeliveryError};
use pollcast_http::{DeliveryConfig, HttpDeliveryClient, USER_AGENT_VALUE};
use url::Url;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client() -> HttpDeliveryClient {
    HttpDeliveryClient::new(DeliveryConfig::default()).expect("failed to create client")
}

fn capture_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/capture", server.uri())).unwrap()
}

/// A local port nothing listens on.
fn closed_port_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}/capture")).unwrap()
}

#[tokio::test]
async fn test_deliver_success_headers_and_body() {
    let server = MockServer::start().await;
    let payload = br#"{"schemaVersion":"1.0"}"#.to_vec();

    Mock::given(method("POST"))
        .and(path("/capture"))
        .and(header("content-type", "text/plain"))
        .and(header("content-length", payload.len().to_string().as_str()))
        .and(header("user-agent", USER_AGENT_VALUE))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = create_client()
        .deliver(&capture_url(&server), &payload)
        .await
        .expect("deliver failed");

    assert_eq!(outcome.status_code, 200);
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_deliver_custom_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("content-type", "application/xml"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        HttpDeliveryClient::new(DeliveryConfig::default().with_content_type("application/xml"))
            .unwrap();
    let outcome = client
        .deliver(&capture_url(&server), b"<EPCISQueryDocument/>")
        .await
        .unwrap();

    assert_eq!(outcome.status_code, 204);
}

#[tokio::test]
async fn test_error_status_is_an_outcome_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1) // no retry
        .mount(&server)
        .await;

    let outcome = create_client()
        .deliver(&capture_url(&server), b"payload")
        .await
        .expect("status codes are not transport errors");

    assert_eq!(outcome.status_code, 503);
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/capture"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", "/moved"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(path("/moved"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = create_client()
        .deliver(&capture_url(&server), b"payload")
        .await
        .unwrap();

    assert_eq!(outcome.status_code, 307);
}

#[tokio::test]
async fn test_basic_auth_from_destination_userinfo() {
    let server = MockServer::start().await;
    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode("alice:s3cret")
    );

    Mock::given(method("POST"))
        .and(path("/capture"))
        .and(header("authorization", expected.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut url = capture_url(&server);
    url.set_username("alice").unwrap();
    url.set_password(Some("s3cret")).unwrap();

    let outcome = create_client().deliver(&url, b"payload").await.unwrap();
    assert_eq!(outcome.status_code, 200);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let result = create_client()
        .deliver(&closed_port_url(), b"payload")
        .await;

    assert!(
        matches!(result, Err(DeliveryError::Transport { .. })),
        "got {result:?}"
    );
}

#[tokio::test]
async fn test_slow_destination_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client =
        HttpDeliveryClient::new(DeliveryConfig::default().with_timeout(Duration::from_millis(500)))
            .unwrap();
    let result = client.deliver(&capture_url(&server), b"payload").await;

    assert_eq!(
        result,
        Err(DeliveryError::Timeout {
            after: Duration::from_millis(500)
        })
    );
}

#[tokio::test]
async fn test_repeated_deliveries_each_post_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(5)
        .mount(&server)
        .await;

    let client = create_client();
    let url = capture_url(&server);
    for _ in 0..5 {
        let outcome = client.deliver(&url, b"payload").await.unwrap();
        assert_eq!(outcome.status_code, 200);
    }
}
