//! Stripe webhook signature verification.
//!
//! Implements Stripe's signing scheme: the `Stripe-Signature` header
//! carries a timestamp and one or more `v1` HMAC-SHA256 signatures over
//! `"{timestamp}.{payload}"`.
//! <https://docs.stripe.com/webhooks/signature>
//!
//! Multiple `v1` entries appear while a webhook secret is being rolled;
//! the delivery is accepted if any of them matches.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::error::WebhookError;
use super::types::Event;

/// Maximum accepted age (and clock skew) of a delivery, in seconds.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Parsed `Stripe-Signature` header.
#[derive(Debug)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

impl SignatureHeader {
    /// Parse a header of the form `t=1699000000,v1=abc...,v1=def...`.
    fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    let ts = value.parse::<i64>().map_err(|_| {
                        WebhookError::MalformedHeader("non-numeric timestamp".to_string())
                    })?;
                    timestamp = Some(ts);
                }
                "v1" => signatures.push(value.to_string()),
                // v0 is the legacy scheme; ignore it like other unknown keys
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| WebhookError::MalformedHeader("missing timestamp".to_string()))?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedHeader(
                "no v1 signatures".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verify a webhook delivery's signature and freshness.
///
/// # Errors
///
/// Returns `WebhookError` if the header is malformed, the timestamp is
/// outside the replay tolerance, or no signature matches.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &SecretString,
) -> Result<(), WebhookError> {
    verify_signature_at(payload, header, secret, unix_now()?)
}

/// Like [`verify_signature`], with an injectable clock for tests.
fn verify_signature_at(
    payload: &str,
    header: &str,
    secret: &SecretString,
    now: i64,
) -> Result<(), WebhookError> {
    let parsed = SignatureHeader::parse(header)?;

    if (now - parsed.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::StaleTimestamp);
    }

    let signed_payload = format!("{}.{payload}", parsed.timestamp);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| WebhookError::MalformedHeader(e.to_string()))?;
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if parsed
        .signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        Ok(())
    } else {
        Err(WebhookError::SignatureMismatch)
    }
}

/// Verify a delivery and parse its payload into an [`Event`].
///
/// # Errors
///
/// Returns `WebhookError` if verification fails or the payload is not a
/// valid event.
pub fn construct_event(
    payload: &str,
    header: &str,
    secret: &SecretString,
) -> Result<Event, WebhookError> {
    verify_signature(payload, header, secret)?;
    serde_json::from_str(payload).map_err(|e| WebhookError::Payload(e.to_string()))
}

/// Current Unix time in seconds.
fn unix_now() -> Result<i64, WebhookError> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| WebhookError::MalformedHeader(e.to_string()))?
        .as_secs();
    i64::try_from(now).map_err(|_| WebhookError::MalformedHeader("system time overflow".to_string()))
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
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_signing_secret";

    fn sign(payload: &str, timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn secret() -> SecretString {
        SecretString::from(SECRET.to_string())
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_valid_signature() {
        let payload = r#"{"id":"evt_1"}"#;
        let ts = 1_700_000_000;
        let header = format!("t={ts},v1={}", sign(payload, ts));

        assert!(verify_signature_at(payload, &header, &secret(), ts + 10).is_ok());
    }

    #[test]
    fn test_second_v1_matches_during_secret_roll() {
        let payload = r#"{"id":"evt_1"}"#;
        let ts = 1_700_000_000;
        let header = format!("t={ts},v1=deadbeef,v1={}", sign(payload, ts));

        assert!(verify_signature_at(payload, &header, &secret(), ts).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = r#"{"id":"evt_1"}"#;
        let ts = 1_700_000_000;
        let header = format!("t={ts},v1={}", sign(payload, ts));

        let result = verify_signature_at(r#"{"id":"evt_2"}"#, &header, &secret(), ts);
        assert!(matches!(result, Err(WebhookError::SignatureMismatch)));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = r#"{"id":"evt_1"}"#;
        let ts = 1_700_000_000;
        let header = format!("t={ts},v1={}", sign(payload, ts));

        let result = verify_signature_at(payload, &header, &secret(), ts + 301);
        assert!(matches!(result, Err(WebhookError::StaleTimestamp)));
    }

    #[test]
    fn test_malformed_headers_rejected() {
        let payload = "{}";

        for header in ["", "v1=abc", "t=notanumber,v1=abc", "t=1700000000"] {
            let result = verify_signature_at(payload, header, &secret(), 1_700_000_000);
            assert!(
                matches!(result, Err(WebhookError::MalformedHeader(_))),
                "expected malformed header error for {header:?}"
            );
        }
    }

    #[test]
    fn test_construct_event_parses_payload() {
        let payload = r#"{
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_test_a1"}}
        }"#;
        let ts = unix_now().unwrap();
        let header = format!("t={ts},v1={}", sign(payload, ts));

        let event = construct_event(payload, &header, &secret()).unwrap();
        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "checkout.session.completed");
    }

    #[test]
    fn test_construct_event_rejects_invalid_json() {
        let payload = "not json";
        let ts = unix_now().unwrap();
        let header = format!("t={ts},v1={}", sign(payload, ts));

        let result = construct_event(payload, &header, &secret());
        assert!(matches!(result, Err(WebhookError::Payload(_))));
    }
}
