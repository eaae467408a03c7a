mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use withrisk::{
    application::repos::SeedReport,
    bootstrap::{self, SeedOutcome},
    config::AppEnvironment,
};

use common::{body_json, get, json_request, send};

struct TestApp {
    router: Router,
    _dir: TempDir,
}

async fn app(environment: AppEnvironment) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = common::sqlite_settings(dir.path(), environment);
    let booted = bootstrap::bootstrap(&settings).await.expect("bootstrap");
    assert_eq!(
        booted.seed,
        SeedOutcome::Succeeded(SeedReport {
            posts: 3,
            comments: 3
        })
    );
    TestApp {
        router: booted.router,
        _dir: dir,
    }
}

fn post_body(title: &str, category: &str) -> Value {
    json!({
        "title": title,
        "summary": "short",
        "body": "Long form text.",
        "category": category,
    })
}

async fn create_post(router: &Router, title: &str, category: &str) -> Value {
    let response = send(
        router,
        json_request("POST", "/api/posts", &post_body(title, category)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn seeded_posts_are_listed_newest_first() {
    let app = app(AppEnvironment::Production).await;

    let response = send(&app.router, get("/api/posts")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let posts = body_json(response).await;
    let slugs: Vec<&str> = posts
        .as_array()
        .expect("array")
        .iter()
        .map(|post| post["slug"].as_str().expect("slug"))
        .collect();
    assert_eq!(
        slugs,
        vec![
            "measuring-what-matters",
            "shipping-on-a-friday",
            "welcome-to-with-risk"
        ]
    );
}

#[tokio::test]
async fn category_filter_ignores_case_and_limit_applies() {
    let app = app(AppEnvironment::Production).await;

    let posts = body_json(send(&app.router, get("/api/posts?category=ENGINEERING")).await).await;
    let posts = posts.as_array().expect("array");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["slug"], "shipping-on-a-friday");

    let limited = body_json(send(&app.router, get("/api/posts?limit=2")).await).await;
    assert_eq!(limited.as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn post_lifecycle() {
    let app = app(AppEnvironment::Production).await;

    let created = create_post(&app.router, "Hello Rust World", "rust").await;
    assert_eq!(created["slug"], "hello-rust-world");
    let id = created["id"].as_str().expect("id").to_string();

    let fetched = send(&app.router, get(&format!("/api/posts/{id}"))).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(body_json(fetched).await["title"], "Hello Rust World");

    let updated = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/posts/{id}"),
            &post_body("Hello Again", "rust"),
        ),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(body_json(updated).await["title"], "Hello Again");

    let deleted = send(
        &app.router,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/posts/{id}"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = send(&app.router, get(&format!("/api/posts/{id}"))).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_post_is_rejected_with_field_details() {
    let app = app(AppEnvironment::Production).await;

    let response = send(
        &app.router,
        json_request("POST", "/api/posts", &post_body("", "rust")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .expect("details")
        .iter()
        .map(|detail| detail["field"].as_str().expect("field"))
        .collect();
    assert_eq!(fields, vec!["title"]);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app(AppEnvironment::Production).await;

    let response = send(
        &app.router,
        Request::builder()
            .method("POST")
            .uri("/api/posts")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"][0]["field"], "request");
}

#[tokio::test]
async fn malformed_path_and_query_are_json_bad_requests() {
    let app = app(AppEnvironment::Production).await;

    let response = send(&app.router, get("/api/posts/not-a-uuid")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "path");

    let response = send(&app.router, get("/api/posts?limit=abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "query");
}

#[tokio::test]
async fn repeated_title_gets_a_suffixed_slug() {
    let app = app(AppEnvironment::Production).await;

    let first = create_post(&app.router, "Same Title", "rust").await;
    let second = create_post(&app.router, "Same Title", "rust").await;
    assert_eq!(first["slug"], "same-title");
    assert_eq!(second["slug"], "same-title-2");
}

#[tokio::test]
async fn comments_use_body_author_then_forwarded_user_then_anonymous() {
    let app = app(AppEnvironment::Production).await;
    let post = create_post(&app.router, "Talk To Me", "meta").await;
    let id = post["id"].as_str().expect("id").to_string();
    let uri = format!("/api/posts/{id}/comments");

    let explicit = send(
        &app.router,
        json_request("POST", &uri, &json!({ "author": "ada", "body": "first" })),
    )
    .await;
    assert_eq!(explicit.status(), StatusCode::CREATED);
    assert_eq!(body_json(explicit).await["author"], "ada");

    let forwarded = send(
        &app.router,
        Request::builder()
            .method("POST")
            .uri(&uri)
            .header("content-type", "application/json")
            .header("x-forwarded-user", "grace")
            .body(Body::from(json!({ "body": "second" }).to_string()))
            .expect("request"),
    )
    .await;
    assert_eq!(forwarded.status(), StatusCode::CREATED);
    assert_eq!(body_json(forwarded).await["author"], "grace");

    let anonymous = send(&app.router, json_request("POST", &uri, &json!({ "body": "third" }))).await;
    assert_eq!(body_json(anonymous).await["author"], "anonymous");

    let listed = body_json(send(&app.router, get(&uri)).await).await;
    let bodies: Vec<&str> = listed
        .as_array()
        .expect("array")
        .iter()
        .map(|comment| comment["body"].as_str().expect("body"))
        .collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn comments_on_unknown_post_are_not_found() {
    let app = app(AppEnvironment::Production).await;
    let uri = format!("/api/posts/{}/comments", uuid::Uuid::new_v4());

    assert_eq!(
        send(&app.router, get(&uri)).await.status(),
        StatusCode::NOT_FOUND
    );
    let created = send(&app.router, json_request("POST", &uri, &json!({ "body": "hi" }))).await;
    assert_eq!(created.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_only_listed_origins() {
    let app = app(AppEnvironment::Production).await;

    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/posts")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .expect("request")
    };

    let allowed = send(&app.router, preflight("http://localhost:3000")).await;
    assert_eq!(
        allowed
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("http://localhost:3000")
    );

    let denied = send(&app.router, preflight("https://evil.example")).await;
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn docs_are_served_only_in_development() {
    let dev = app(AppEnvironment::Development).await;
    let response = send(&dev.router, get("/swagger/v1/swagger.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/posts"].is_object());

    let prod = app(AppEnvironment::Production).await;
    let response = send(&prod.router, get("/swagger/v1/swagger.json")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoints_report_no_content() {
    let app = app(AppEnvironment::Production).await;

    assert_eq!(
        send(&app.router, get("/_health")).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        send(&app.router, get("/_health/db")).await.status(),
        StatusCode::NO_CONTENT
    );
}

#[tokio::test]
async fn reseeding_an_existing_database_inserts_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = common::sqlite_settings(dir.path(), AppEnvironment::Production);

    let first = bootstrap::bootstrap(&settings).await.expect("bootstrap");
    assert!(first.seed.is_success());
    first.services.data.close().await;

    let services = bootstrap::register_services(&settings).expect("services");
    let outcome = bootstrap::run_startup_seed(&services.data, settings.startup.seed_timeout).await;
    assert_eq!(outcome, SeedOutcome::Succeeded(SeedReport::default()));
}
