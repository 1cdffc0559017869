//! Payment provider callbacks, verified with HMAC-SHA256.
//!
//! Header format: `t=<unix seconds>,v1=<hex mac>`, where the MAC covers
//! `"{t}.{raw body}"` under the shared webhook secret.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::payment::MerchantUid;

pub const SIGNATURE_HEADER: &str = "x-payment-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header is malformed")]
    Malformed,
    #[error("signature does not match payload")]
    Mismatch,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("webhook secret is not usable as an HMAC key")]
    BadSecret,
}

/// Payment status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Ready,
    Paid,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    pub imp_uid: Option<String>,
    pub merchant_uid: MerchantUid,
    pub status: ProviderStatus,
}

/// Build a header value for `payload` signed at `timestamp`.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let mac = compute_mac(payload, secret, timestamp)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
}

/// Check `header` against `payload`. `now` is unix seconds.
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_seconds: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = Some(v);
        }
    }

    let timestamp: i64 = timestamp
        .and_then(|t| t.parse().ok())
        .ok_or(SignatureError::Malformed)?;
    let signature = signature
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Malformed)?;
    let expected = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;

    // verify_slice compares in constant time
    compute_mac(payload, secret, timestamp)?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)?;

    if (now - timestamp).abs() > tolerance_seconds {
        return Err(SignatureError::Expired);
    }

    Ok(())
}

fn compute_mac(payload: &[u8], secret: &str, timestamp: i64) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::BadSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}
