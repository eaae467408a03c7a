#![allow(dead_code)]

use std::{num::NonZeroU32, path::Path, time::Duration};

use axum::{Router, body::Body, http::Request, response::Response};
use serde_json::Value;
use tower::ServiceExt;
use tracing::level_filters::LevelFilter;
use withrisk::config::{
    AppEnvironment, AppSettings, DatabaseSettings, LogFormat, LoggingSettings, ServerSettings,
    Settings, StartupSettings,
};

pub fn settings(connection_string: Option<String>, environment: AppEnvironment) -> Settings {
    Settings {
        server: ServerSettings {
            addr: "127.0.0.1:0".parse().expect("socket addr"),
            graceful_shutdown: Duration::from_secs(1),
        },
        logging: LoggingSettings {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        },
        database: DatabaseSettings {
            connection_string,
            max_connections: NonZeroU32::new(1).expect("non-zero"),
            acquire_timeout: Duration::from_secs(1),
        },
        app: AppSettings {
            environment,
            docs_ui: environment == AppEnvironment::Development,
        },
        startup: StartupSettings {
            seed_timeout: Duration::from_secs(10),
        },
    }
}

pub fn sqlite_settings(dir: &Path, environment: AppEnvironment) -> Settings {
    let path = dir.join("blog.db");
    settings(
        Some(format!("Data Source={}", path.display())),
        environment,
    )
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}
