use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tiendanube_client::{ApiError, ApiRequest, Credentials, StoreApi, StoreClient};
use tiendanube_core::ErrorKind;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> StoreClient {
    StoreClient::builder()
        .base_url(format!("{}/v1", server.uri()))
        .user_agent("tiendanube-mcp-tests (qa@example.com)")
        .base_backoff(Duration::from_millis(5))
        .max_retries(2)
        .credentials(Some(Credentials::new("123456", "test-token")))
        .build()
        .expect("store client")
}

#[tokio::test]
async fn sends_auth_and_user_agent_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/123456/store"))
        .and(header("Authentication", "bearer test-token"))
        .and(header("User-Agent", "tiendanube-mcp-tests (qa@example.com)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 123456})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = client.get("/store", Vec::new()).await.expect("store");

    assert_eq!(body["id"], 123456);
}

#[tokio::test]
async fn forwards_query_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/123456/products"))
        .and(query_param("page", "2"))
        .and(query_param("q", "remera"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-total-count", "41")
                .set_body_json(json!([{"id": 1}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/123456/categories"))
        .and(body_json(json!({"name": {"es": "Remeras"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .send(ApiRequest::get("/products").with_query(vec![
            ("page".to_string(), "2".to_string()),
            ("q".to_string(), "remera".to_string()),
        ]))
        .await
        .expect("list");
    assert_eq!(response.meta.total_count, Some(41));

    let created = client.post("/categories", json!({"name": {"es": "Remeras"}})).await.expect("create");
    assert_eq!(created["id"], 9);
}

#[tokio::test]
async fn retries_server_errors_until_success() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    Mock::given(method("GET"))
        .and(path("/v1/123456/orders"))
        .respond_with(move |_request: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(json!([]))
            }
        })
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = client.get("/orders", Vec::new()).await.expect("orders");

    assert_eq!(body, json!([]));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retries_rate_limits_honouring_retry_after() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    Mock::given(method("GET"))
        .and(path("/v1/123456/customers"))
        .respond_with(move |_request: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(429).insert_header("Retry-After", "0")
            } else {
                ResponseTemplate::new(200).set_body_json(json!([{"id": 3}]))
            }
        })
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = client.get("/customers", Vec::new()).await.expect("customers");

    assert_eq!(body[0]["id"], 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn does_not_retry_client_errors_and_maps_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/123456/products/77"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "Not Found",
            "description": "Product with such id does not exist"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client.get("/products/77", Vec::new()).await.expect_err("missing product");

    assert!(error.is_not_found());
    match &error {
        ApiError::Status { message, body, .. } => {
            assert_eq!(message, "Product with such id does not exist");
            assert_eq!(body.as_ref().map(|b| b["code"].clone()), Some(json!(404)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_body_decodes_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/123456/coupons/5"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = client.delete("/coupons/5").await.expect("delete");

    assert!(body.is_null());
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let server = MockServer::start().await;
    let client = StoreClient::builder()
        .base_url(server.uri())
        .build()
        .expect("store client");

    let error = client.get("/store", Vec::new()).await.expect_err("no credentials");

    assert!(matches!(error, ApiError::MissingCredentials));
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn credentials_can_be_swapped_at_runtime() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/999/store"))
        .and(header("Authentication", "bearer other-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 999})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_credentials(Some(Credentials::new("999", "other-token")));

    let body = client.get("/store", Vec::new()).await.expect("store");
    assert_eq!(body["id"], 999);
    assert_eq!(client.credentials().map(|c| c.store_id), Some("999".to_string()));
}

#[tokio::test]
async fn send_as_uses_the_given_credentials_only_for_that_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/555/store"))
        .and(header("Authentication", "bearer candidate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 555})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .send_as(ApiRequest::get("/store"), &Credentials::new("555", "candidate"))
        .await
        .expect("store");

    assert_eq!(response.body["id"], 555);
    assert_eq!(client.credentials().map(|c| c.store_id), Some("123456".to_string()));
}

#[tokio::test]
async fn retries_timeouts_as_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/123456/store"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(2)
        .mount(&server)
        .await;

    let client = StoreClient::builder()
        .base_url(format!("{}/v1", server.uri()))
        .timeout(Duration::from_millis(50))
        .base_backoff(Duration::from_millis(5))
        .max_retries(1)
        .credentials(Some(Credentials::new("123456", "test-token")))
        .build()
        .expect("store client");

    let error = client.get("/store", Vec::new()).await.expect_err("timed out");

    assert_eq!(error.kind(), ErrorKind::Transport);
    assert!(error.kind().is_transient());
}
