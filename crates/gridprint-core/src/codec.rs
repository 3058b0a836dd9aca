//! The blueprint string format: a version character, then base64 of the
//! zlib-compressed JSON document.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde_json::Value;

/// The only string format version in use.
pub const FORMAT_VERSION: char = '0';

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("blueprint string is empty")]
    Empty,
    #[error("unsupported blueprint string version '{0}'")]
    UnsupportedVersion(char),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid zlib stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a blueprint string into its JSON document.
pub fn decode(s: &str) -> Result<Value, CodecError> {
    let s = s.trim();
    let mut chars = s.chars();
    let version = chars.next().ok_or(CodecError::Empty)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let compressed = STANDARD.decode(chars.as_str())?;
    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;
    tracing::trace!(compressed = compressed.len(), inflated = json.len(), "decoded blueprint string");

    Ok(serde_json::from_slice(&json)?)
}

/// Encode a JSON document as a blueprint string.
pub fn encode(value: &Value) -> Result<String, CodecError> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    tracing::trace!(inflated = json.len(), compressed = compressed.len(), "encoded blueprint string");

    let mut out = String::with_capacity(1 + compressed.len() * 4 / 3 + 4);
    out.push(FORMAT_VERSION);
    STANDARD.encode_string(compressed, &mut out);
    Ok(out)
}
