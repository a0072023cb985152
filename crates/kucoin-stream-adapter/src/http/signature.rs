/*
[INPUT]:  Request parameters and API credentials
[OUTPUT]: Signed KC-API request headers
[POS]:    HTTP layer - request signing for authenticated endpoints
[UPDATE]: When changing signing algorithm or header format
*/

use crate::error::{KucoinError, Result};
use crate::http::Credentials;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// KC-API key version in use (v2 signs the passphrase as well)
const KEY_VERSION: &str = "2";

/// Signs HTTP requests according to the KC-API v2 specification
#[derive(Debug)]
pub struct RequestSigner;

impl RequestSigner {
    /// Build the full KC-API header set for one request.
    ///
    /// The signature covers `{timestamp}{method}{endpoint}{body}` where
    /// `endpoint` includes the query string and `body` is the exact JSON
    /// payload sent (empty string for GET requests).
    pub fn headers(
        credentials: &Credentials,
        method: &str,
        endpoint: &str,
        body: &str,
    ) -> Result<Vec<(&'static str, String)>> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let payload = format!("{timestamp}{method}{endpoint}{body}");
        let signature = Self::sign(&credentials.api_secret, &payload)?;
        let passphrase = Self::sign(&credentials.api_secret, &credentials.api_passphrase)?;

        Ok(vec![
            ("KC-API-KEY", credentials.api_key.clone()),
            ("KC-API-SIGN", signature),
            ("KC-API-TIMESTAMP", timestamp),
            ("KC-API-PASSPHRASE", passphrase),
            ("KC-API-KEY-VERSION", KEY_VERSION.to_string()),
        ])
    }

    /// HMAC-SHA256 over `payload` keyed with `secret`, base64-encoded
    fn sign(secret: &str, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| KucoinError::Config(format!("invalid API secret: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}
