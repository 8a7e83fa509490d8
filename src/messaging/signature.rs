//! Callback signature verification.
//!
//! The platform signs the raw request body with HMAC-SHA256 under the
//! channel secret and sends the base64 digest in the `X-Line-Signature`
//! header. Verification must run before any pipeline component; a mismatch
//! rejects the request with no side effects.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::error;

/// Verify an inbound callback signature against the raw request body.
pub fn verify_callback_signature(channel_secret: &str, body: &str, signature: &str) -> bool {
    let mut mac = match Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return false;
        }
    };
    mac.update(body.as_bytes());

    let Ok(expected) = BASE64.decode(signature) else {
        error!("Signature header is not valid base64");
        return false;
    };

    mac.verify_slice(&expected).is_ok()
}

/// Compute the signature the platform would send for `body`.
pub fn compute_signature(channel_secret: &str, body: &str) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return String::new();
        }
    };
    mac.update(body.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}
