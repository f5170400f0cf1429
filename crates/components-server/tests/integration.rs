use axum::http::StatusCode;
use http_body_util::BodyExt;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Success responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn healthz_returns_data_as_json() {
    let app = components_server::build_router();
    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn valid_port_is_echoed() {
    let app = components_server::build_router();
    let (status, body) = get(app, "/api/ports/8080").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "port": 8080, "valid": true }));
}

// ---------------------------------------------------------------------------
// Error responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_port_uses_validation_code() {
    let app = components_server::build_router();
    let (status, body) = get(app, "/api/ports/65535").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 100001);
    assert_eq!(body["message"], "Validation failed");
    assert!(body.get("reference").is_none());
}

#[tokio::test]
async fn unparseable_port_uses_bind_code() {
    let app = components_server::build_router();
    let (status, body) = get(app, "/api/ports/http").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 100002);
}

#[tokio::test]
async fn aggregate_response_uses_first_error_code() {
    let app = components_server::build_router();
    let (status, body) = post_json(
        app,
        "/api/validate",
        serde_json::json!({ "log": { "level": "loud" }, "port": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 100001);
}

#[tokio::test]
async fn valid_settings_pass() {
    let app = components_server::build_router();
    let (status, body) = post_json(
        app,
        "/api/validate",
        serde_json::json!({ "log": { "level": "debug", "format": "json" }, "port": 443 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn unknown_route_is_page_not_found() {
    let app = components_server::build_router();
    let (status, body) = get(app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 100003);
    assert_eq!(body["message"], "Page not found");
}

#[tokio::test]
async fn untagged_error_is_internal() {
    let response = components_server::write_response::<()>(Err(anyhow::anyhow!("db down")));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: components_server::ErrResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(body.code, 1);
    assert_eq!(body.message, "An internal server error occurred");
    assert_eq!(body.reference, "");
}
