pub mod api;
pub mod cors;
pub mod docs;
pub mod middleware;
mod user;

pub use api::{ApiState, build_api_router};
pub use user::RequestUser;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn db_health(State(state): State<ApiState>) -> Response {
    db_health_response(state.data.health_check().await)
}

pub fn build_health_router() -> Router<ApiState> {
    Router::new()
        .route("/_health", get(health))
        .route("/_health/db", get(db_health))
}
