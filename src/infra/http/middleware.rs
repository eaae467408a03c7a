use std::{any::Any, convert::Infallible, time::Instant};

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{HeaderMap, Request, StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::{ErrorReport, internal_error_response};
use crate::infra::telemetry::{HTTP_INTERNAL_ERRORS_TOTAL, HTTP_PANICS_TOTAL};

/// Identity asserted by a fronting proxy. Not verified.
pub const FORWARDED_USER_HEADER: &str = "x-forwarded-user";

#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub user: Option<String>,
}

impl RequestContext {
    fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            user: forwarded_user(headers),
        }
    }
}

pub(crate) fn forwarded_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_headers(&parts.headers)))
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::from_headers(request.headers());
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let (request_id, user) = match request.extensions().get::<RequestContext>() {
        Some(ctx) => (ctx.request_id.clone(), ctx.user.clone()),
        None => (String::new(), None),
    };

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "withrisk::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                user = user.as_deref().unwrap_or(""),
                "request failed",
            );
        } else {
            warn!(
                target = "withrisk::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                user = user.as_deref().unwrap_or(""),
                "client request error",
            );
        }
    }

    response
}

/// Replace every 500 produced downstream with the fixed internal-error body.
pub async fn mask_internal_errors(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::INTERNAL_SERVER_ERROR {
        return response;
    }

    counter!(HTTP_INTERNAL_ERRORS_TOTAL).increment(1);

    let (parts, _body) = response.into_parts();
    let mut masked = internal_error_response();
    if let Some(ctx) = parts.extensions.get::<RequestContext>().cloned() {
        masked.extensions_mut().insert(ctx);
    }
    masked
}

/// Panic handler for the outermost catch-panic layer.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    counter!(HTTP_PANICS_TOTAL).increment(1);
    error!(
        target = "withrisk::http::panic",
        detail = %detail,
        "request handler panicked"
    );

    let mut response = internal_error_response();
    ErrorReport::from_message(
        "infra::http::middleware::handle_panic",
        StatusCode::INTERNAL_SERVER_ERROR,
        detail,
    )
    .attach(&mut response);
    response
}
