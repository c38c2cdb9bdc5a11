//! Service key authentication for function endpoints.
//!
//! The web process is the only caller; it presents the shared key as
//! `Authorization: Bearer <key>`. Anything else gets a 401 with no
//! detail about what was wrong.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Require a valid service key on the request.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the header is missing, not a
/// bearer token, or the key does not match.
pub async fn require_service_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let expected = state.config().service_key.expose_secret();
    if !constant_time_compare(presented, expected) {
        tracing::warn!("function call with invalid service key");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("service-key", "service-key"));
        assert!(!constant_time_compare("service-key", "service-kez"));
        assert!(!constant_time_compare("short", "longer-key"));
    }
}
