//! Span and log hooks plugged into `tower_http::trace::TraceLayer`.

use axum::http::{HeaderMap, Request, Response};
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tracing::{info_span, Span};

const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "x-api-key"];

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// The query string is left out of the span: search terms can be long and
/// credentials must never end up in logs.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let headers = request.headers();
    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = header(headers, "x-request-id"),
        user_agent = header(headers, "user-agent"),
    )
}

pub fn on_request<B>(request: &Request<B>, _span: &Span) {
    let redacted: Vec<&str> = request
        .headers()
        .keys()
        .map(|name| name.as_str())
        .filter(|name| REDACTED_HEADERS.contains(name))
        .collect();

    tracing::debug!(redacted_headers = ?redacted, "Incoming HTTP request");
}

pub fn on_response<B>(response: &Response<B>, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis();

    if status.is_server_error() {
        tracing::error!(status = %status, latency_ms, "HTTP request completed with server error");
    } else if status.is_client_error() {
        tracing::warn!(status = %status, latency_ms, "HTTP request completed with client error");
    } else {
        tracing::info!(status = %status, latency_ms, "HTTP request completed");
    }
}

pub fn on_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    let error_type = match &error {
        ServerErrorsFailureClass::StatusCode(code) => format!("HTTP {}", code.as_u16()),
        ServerErrorsFailureClass::Error(_) => "Internal Error".to_string(),
    };

    tracing::error!(
        error = %error,
        error_type,
        latency_ms = latency.as_millis(),
        "HTTP request failed"
    );
}
