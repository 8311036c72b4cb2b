//! HMAC signatures for cookie-carried payloads
//!
//! Format: `value` + `.` + base64url(hmac_sha256(value, secret)), no padding.
//! `value` itself must not contain a `.`; base64url payloads never do.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a value with the given secret
pub fn sign(value: &str, secret: &str) -> String {
    format!("{}.{}", value, create_signature(value, secret))
}

fn create_signature(value: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail here.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take key of any size"),
    };
    mac.update(value.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Verify a signed value and return the original on success
pub fn unsign(signed_value: &str, secret: &str) -> Option<String> {
    let (value, provided_signature) = signed_value.rsplit_once('.')?;
    let expected_signature = create_signature(value, secret);

    if constant_time_compare(&expected_signature, provided_signature) {
        Some(value.to_string())
    } else {
        None
    }
}

/// Try to unsign with multiple secrets (for secret rotation)
pub fn unsign_with_secrets(signed_value: &str, secrets: &[String]) -> Option<String> {
    secrets
        .iter()
        .find_map(|secret| unsign(signed_value, secret))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
