//! CSP nonce generation middleware.
//!
//! Generates a unique nonce per request for Content Security Policy.
//! The nonce is made available to templates via request extensions, and
//! the security headers middleware folds it into the `script-src`
//! directive of the CSP header.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;

/// CSP nonce for the current request.
///
/// This is inserted into request extensions by the middleware and can be
/// extracted in handlers to pass to templates.
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    ///
    /// Uses 16 bytes of randomness, base64-encoded.
    fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }
}

/// Middleware that generates a CSP nonce and adds it to request extensions.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    let nonce = CspNonce::generate();
    request.extensions_mut().insert(nonce);
    next.run(request).await
}

/// Extractor for the CSP nonce in handlers.
impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            // This should never happen if middleware is properly configured
            tracing::warn!("CSP nonce not found in request extensions");
            Self(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_generation() {
        let nonce1 = CspNonce::generate();
        let nonce2 = CspNonce::generate();

        // Nonces should be unique
        assert_ne!(nonce1.0, nonce2.0);

        // Nonces should be non-empty
        assert!(!nonce1.0.is_empty());

        // Base64 encoded 16 bytes = 24 characters
        assert_eq!(nonce1.0.len(), 24);
    }
}
