//! Transport-safe encoding of diagram source.
//!
//! Placeholder containers carry their diagram source as a single-line base64
//! attribute so that line-oriented passes cannot split or rewrite it.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;

/// Error decoding a placeholder payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encode diagram source for a placeholder attribute.
#[must_use]
pub fn encode(source: &str) -> String {
    BASE64_STANDARD.encode(source.as_bytes())
}

/// Decode a placeholder attribute back to diagram source.
pub fn decode(payload: &str) -> Result<String, PayloadError> {
    let bytes = BASE64_STANDARD.decode(payload)?;
    Ok(String::from_utf8(bytes)?)
}
