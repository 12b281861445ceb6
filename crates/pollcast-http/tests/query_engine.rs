//! Integration tests for HttpQueryEngine.

use chrono::{TimeZone, Utc};
use pollcast_core::{QueryEngine, QueryError, QueryParam};
use pollcast_http::{HttpQueryEngine, QueryEngineConfig};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_engine(server: &MockServer) -> HttpQueryEngine {
    HttpQueryEngine::new(QueryEngineConfig::default().with_url(server.uri()))
        .expect("failed to create engine")
}

#[tokio::test]
async fn test_poll_sends_params_and_parses_result() {
    let server = MockServer::start().await;
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

    Mock::given(method("POST"))
        .and(path("/poll"))
        .and(body_json(json!({
            "queryName": "SimpleEventQuery",
            "params": [
                {"name": "EQ_bizStep", "type": "text", "value": "shipping"},
                {"name": "GE_recordTime", "type": "time", "value": "2024-03-01T00:00:00Z"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queryName": "SimpleEventQuery",
            "objectEvents": [{"action": "ADD"}, {"action": "OBSERVE"}],
            "quantityEvents": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = create_engine(&server)
        .poll(
            "SimpleEventQuery",
            &[
                QueryParam::text("EQ_bizStep", "shipping"),
                QueryParam::time_filter(t0),
            ],
        )
        .await
        .expect("poll failed");

    let counts = result.counts();
    assert_eq!(counts.object, 2);
    assert_eq!(counts.quantity, 0);
    assert!(result.aggregation_events.is_none());
    assert!(result.subscription_id.is_none());
}

#[tokio::test]
async fn test_engine_fault_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "QueryParameterException",
            "message": "unknown parameter EQ_foo"
        })))
        .mount(&server)
        .await;

    let err = create_engine(&server)
        .poll("SimpleEventQuery", &[])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        QueryError::Fault {
            code: "QueryParameterException".to_string(),
            message: "unknown parameter EQ_foo".to_string(),
        }
    );
}

#[tokio::test]
async fn test_engine_error_status_without_fault_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let err = create_engine(&server)
        .poll("SimpleEventQuery", &[])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        QueryError::Fault {
            code: "HTTP 500".to_string(),
            message: "internal error".to_string(),
        }
    );
}

#[tokio::test]
async fn test_malformed_result_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy login</html>"))
        .mount(&server)
        .await;

    let err = create_engine(&server)
        .poll("SimpleEventQuery", &[])
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_unreachable_engine_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let engine = HttpQueryEngine::new(
        QueryEngineConfig::default().with_url(format!("http://127.0.0.1:{port}")),
    )
    .unwrap();
    let err = engine.poll("SimpleEventQuery", &[]).await.unwrap_err();

    assert!(matches!(err, QueryError::Unavailable { .. }), "got {err:?}");
}
