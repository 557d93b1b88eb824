//! General-purpose middleware for the API.
//!
//! Request logging with a per-request span and id, and the CORS policy that
//! lets the recording frontend call the backend from the browser.

use std::{
    net::SocketAddr,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, Request,
    },
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn, Instrument};

use crate::config::FrontendConfig;

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Logs every request inside a span carrying the remote address, method and
/// path, and stamps the response with `x-request-id`.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed).to_string());

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        remote = %remote,
        method = %method,
        path = %path,
    );

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let status = response.status();
    let latency = started.elapsed().as_millis();

    span.in_scope(|| {
        if status.is_server_error() {
            warn!("{remote} - \"{method} {path}\" - {} - {latency}ms", status.as_u16());
        } else {
            info!("{remote} - \"{method} {path}\" - {} - {latency}ms", status.as_u16());
        }
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Allows the configured frontend origin. Falls back to any origin when the
/// frontend URL is not a valid header value.
pub fn cors_layer(frontend: &FrontendConfig) -> CorsLayer {
    let origin = match HeaderValue::from_str(&frontend.url()) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            warn!("Invalid frontend origin {}: {e}", frontend.url());
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}
