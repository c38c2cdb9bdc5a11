//! Request ID middleware for request tracing.
//!
//! Generates a unique ID for each request, or reuses the `x-request-id`
//! header when an upstream proxy already assigned one. The ID is recorded
//! on the tracing span, tagged on the Sentry scope, and echoed back in the
//! response headers.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that ensures every request has a unique ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    // Check if request already has an ID (from upstream proxy)
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    // Record the request ID on the current span
    Span::current().record("request_id", &request_id);

    // Add to Sentry scope for error correlation
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    // Process the request
    let mut response = next.run(request).await;

    // Add the request ID to response headers
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
    }

    response
}
