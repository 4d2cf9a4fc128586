use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;

use crate::errors::AppError;
use crate::InnerState;

/// Guards the admin routes with a static bearer token. Without a configured
/// token the routes are open, matching a local deployment.
pub async fn require_admin(
    State(state): State<InnerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.admin_token.as_ref() else {
        return Ok(next.run(request).await);
    };

    let presented = extract_bearer(&request).ok_or_else(|| {
        tracing::warn!("Admin request without bearer token");
        AppError::Authentication(anyhow::anyhow!("Missing token"))
    })?;

    if presented != expected.expose_secret().as_str() {
        tracing::warn!("Admin request with invalid bearer token");
        return Err(AppError::Authentication(anyhow::anyhow!("Invalid token")));
    }

    Ok(next.run(request).await)
}

fn extract_bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}
