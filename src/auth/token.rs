use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Claims pulled out of a bearer token. Untrusted beyond structure: the
/// subject is cross-checked against the session token stored on the user
/// record before anything downstream sees it.
#[derive(Debug, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Structurally decode a three-part bearer token WITHOUT verifying its
/// signature. The issuing identity provider is trusted out-of-band; this
/// function provides no authenticity guarantee and must not grow one — a
/// verifying decoder would be a behavioral change, substituted here instead.
pub fn decode_unverified(token: &str) -> Result<SessionClaims, ApiError> {
    let mut parts = token.split('.');
    let (header, payload) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(_sig), None) => (h, p),
        _ => return Err(ApiError::MalformedToken),
    };

    // Header must at least be base64url JSON, even though we ignore it.
    let header_bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| ApiError::MalformedToken)?;
    serde_json::from_slice::<Value>(&header_bytes).map_err(|_| ApiError::MalformedToken)?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| ApiError::MalformedToken)?;
    serde_json::from_slice(&payload_bytes).map_err(|_| ApiError::MalformedToken)
}
