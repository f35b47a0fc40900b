//! HTTP-Redirect binding codec.
//!
//! Encodes XML as raw deflate (no zlib header) followed by standard base64,
//! then URL-encodes the result into a query parameter.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{SamlError, SamlResult};

use super::SamlMessageType;

/// Cap on inflated output, against decompression bombs.
const MAX_INFLATED_SIZE: usize = 1024 * 1024;

/// Encodes an XML document for the HTTP-Redirect binding.
///
/// Returns the base64 payload, not yet URL-encoded.
pub fn encode_redirect(xml: &str) -> SamlResult<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(xml.as_bytes())?;
    let deflated = encoder.finish()?;
    Ok(BASE64.encode(deflated))
}

/// Builds a full redirect URL carrying the encoded message.
///
/// Appends `SAMLRequest` (or `SAMLResponse`) and, when present, `RelayState`
/// as query parameters on `destination`.
pub fn redirect_url(
    destination: &str,
    message_type: SamlMessageType,
    xml: &str,
    relay_state: Option<&str>,
) -> SamlResult<String> {
    let mut url = url::Url::parse(destination)
        .map_err(|e| SamlError::InvalidRequest(format!("bad destination URL: {e}")))?;
    let encoded = encode_redirect(xml)?;
    url.query_pairs_mut()
        .append_pair(message_type.param_name(), &encoded);
    if let Some(relay_state) = relay_state {
        url.query_pairs_mut().append_pair("RelayState", relay_state);
    }
    Ok(url.into())
}

/// Decodes an HTTP-Redirect binding payload back to XML.
///
/// The caller is expected to have already removed URL encoding (query
/// parsers do this); this function handles base64 and inflation.
pub fn decode_redirect(encoded: &str) -> SamlResult<String> {
    let deflated = BASE64.decode(encoded.trim())?;
    let mut decoder = DeflateDecoder::new(&deflated[..]).take(MAX_INFLATED_SIZE as u64 + 1);
    let mut xml = String::new();
    decoder
        .read_to_string(&mut xml)
        .map_err(|e| SamlError::Decode(format!("inflate failed: {e}")))?;
    if xml.len() > MAX_INFLATED_SIZE {
        return Err(SamlError::Decode("inflated payload too large".to_string()));
    }
    Ok(xml)
}
