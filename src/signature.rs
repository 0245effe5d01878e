//! Transifex webhook signature verification (`X-TX-Signature-V2`)

use axum::http::HeaderMap;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;
use tracing::{debug, error, warn};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-tx-signature-v2";
pub const URL_HEADER: &str = "x-tx-url";
pub const DATE_HEADER: &str = "date";

/// Transifex always delivers webhooks with POST, and signs with that method.
const DELIVERY_METHOD: &str = "POST";

/// The headers Transifex signs a delivery with.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureHeaders {
    pub signature: String,
    pub url: String,
    pub date: String,
}

impl SignatureHeaders {
    /// Returns None if any of the three headers is missing or not valid UTF-8.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        Some(Self {
            signature: get(SIGNATURE_HEADER)?,
            url: get(URL_HEADER)?,
            date: get(DATE_HEADER)?,
        })
    }
}

/// Computes the base64 HMAC-SHA256 of `POST\n<url>\n<date>\n<md5(body)>`.
pub fn compute_signature(url: &str, date: &str, body: &[u8], secret: &str) -> Option<String> {
    let content_md5 = hex::encode(Md5::digest(body));
    let message = [DELIVERY_METHOD, url, date, content_md5.as_str()].join("\n");

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message.as_bytes());
    Some(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Checks a delivery's signature against the shared secret.
/// A mismatch is a normal rejection, not an error.
pub fn verify_signature(headers: &SignatureHeaders, body: &[u8], secret: &str) -> bool {
    debug!(
        "Validating signature for url '{}' dated '{}'",
        headers.url, headers.date
    );
    let expected = match compute_signature(&headers.url, &headers.date, body, secret) {
        Some(sig) => sig,
        None => {
            error!("Could not initialise HMAC with the configured secret");
            return false;
        }
    };

    if expected.as_bytes() == headers.signature.as_bytes() {
        true
    } else {
        warn!("Signature mismatch for delivery to '{}'", headers.url);
        debug!("Expected signature {}, got {}", expected, headers.signature);
        false
    }
}
