mod common;

use axum::{
    Router,
    http::{StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};
use withrisk::{
    application::error::{AppError, INTERNAL_ERROR_BODY},
    bootstrap,
    config::AppEnvironment,
};

use common::send;

async fn explode() -> &'static str {
    panic!("handler exploded")
}

async fn bare_500() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "stack trace: secret.rs:42")
}

async fn unexpected() -> Result<&'static str, AppError> {
    Err(AppError::unexpected("connection reset by peer"))
}

async fn router(dir: &std::path::Path) -> Router {
    let settings = common::sqlite_settings(dir, AppEnvironment::Development);
    let services = bootstrap::register_services(&settings).expect("services");
    let routes = bootstrap::build_routes(&services)
        .route("/boom", get(explode))
        .route("/bare", get(bare_500))
        .route("/unexpected", get(unexpected));
    bootstrap::install_pipeline(routes, &services).expect("pipeline")
}

async fn assert_opaque_500(router: &Router, uri: &str) {
    let response = send(router, common::get(uri)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
    assert_eq!(
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/json"),
        "{uri}"
    );
    assert_eq!(
        common::body_bytes(response).await,
        INTERNAL_ERROR_BODY.as_bytes(),
        "{uri}"
    );
}

#[tokio::test]
async fn panics_become_the_fixed_body() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router(dir.path()).await;
    assert_opaque_500(&router, "/boom").await;
}

#[tokio::test]
async fn downstream_500s_are_masked() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router(dir.path()).await;
    assert_opaque_500(&router, "/bare").await;
    assert_opaque_500(&router, "/unexpected").await;
}

#[tokio::test]
async fn client_errors_pass_through_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router(dir.path()).await;

    let response = send(&router, common::get("/no-such-route")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn error_responses_keep_cors_headers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router(dir.path()).await;

    for uri in ["/boom", "/bare", "/unexpected"] {
        let request = axum::http::Request::builder()
            .uri(uri)
            .header("origin", "http://localhost:4321")
            .body(axum::body::Body::empty())
            .expect("request");
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok()),
            Some("http://localhost:4321"),
            "{uri}"
        );
        assert_eq!(
            common::body_bytes(response).await,
            INTERNAL_ERROR_BODY.as_bytes(),
            "{uri}"
        );
    }
}
