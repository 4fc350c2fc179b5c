//! Webhook Signature Verification
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 keyed by the
//! endpoint secret and sends `Stripe-Signature: t=<unix>,v1=<hex>[,v1=...]`.
//! Verification must run on the exact bytes received; a re-serialized body
//! will not match.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum clock skew accepted between signing and verification
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Verify a `Stripe-Signature` header against the current time
pub fn verify_signature(payload: &str, header: &str, secret: &str) -> Result<()> {
    verify_signature_at(
        payload,
        header,
        secret,
        chrono::Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    )
}

/// Verify a `Stripe-Signature` header against an explicit clock
pub fn verify_signature_at(
    payload: &str,
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: u64,
) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::UnverifiedEvent("missing timestamp in signature header".into()))?;
    if candidates.is_empty() {
        return Err(PaymentError::UnverifiedEvent("missing v1 signature".into()));
    }

    let skew = now.abs_diff(timestamp);
    if skew > tolerance_secs {
        return Err(PaymentError::UnverifiedEvent(format!(
            "timestamp outside tolerance ({skew}s)"
        )));
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let matched = candidates.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(signed_payload.as_bytes());
        mac.verify_slice(&expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        Err(PaymentError::UnverifiedEvent("no matching v1 signature".into()))
    }
}

/// Build a `Stripe-Signature` header for `payload`
pub fn sign_payload(payload: &str, secret: &str, timestamp: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Config(e.to_string()))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes())))
}
