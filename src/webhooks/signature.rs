//! Webhook signature verification (HMAC-SHA256).
//!
//! GitHub signs every delivery with the app's shared secret and puts the
//! result in the `X-Hub-Signature-256` header as `sha256=<hex>`. Verification
//! runs against the raw body before any parsing; a delivery with a bad or
//! missing signature never reaches handler code.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parses a signature header value ("sha256=<hex>") into raw bytes.
///
/// Returns `None` for malformed headers: missing or wrong algorithm prefix,
/// invalid hex. Never panics.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 signature of a payload under the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature the way GitHub sends it: "sha256=<hex>".
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies a delivery's signature header against the raw body and secret.
///
/// Returns false for malformed headers as well as signature mismatches. The
/// comparison is constant-time via the HMAC library.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let claimed = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&claimed).is_ok()
}
