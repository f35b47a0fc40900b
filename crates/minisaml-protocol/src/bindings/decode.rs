//! Tolerant message decoding.
//!
//! Messages arrive redirect-bound (deflate + base64), POST-bound (plain
//! base64), or occasionally as raw XML during manual testing. Rather than
//! dispatch on the transport, decoding tries each wire format in a fixed
//! order and takes the first that yields a usable document.

use tracing::debug;

use crate::error::{SamlError, SamlResult};

use super::{post, redirect};

/// Decodes a SAML message payload regardless of binding.
///
/// Strategies, in order:
/// 1. base64 followed by raw inflate (HTTP-Redirect binding)
/// 2. base64 alone (HTTP-POST binding)
/// 3. the payload as-is, accepted only if it already looks like markup
///
/// The first strategy to produce a result wins; an error from one strategy
/// just moves decoding on to the next. Only exhaustion of all three is an
/// error.
pub fn decode_any(payload: &str) -> SamlResult<String> {
    match redirect::decode_redirect(payload) {
        Ok(xml) => {
            debug!("decoded message via deflate+base64");
            return Ok(xml);
        }
        Err(err) => debug!(error = %err, "deflate+base64 decode failed, trying plain base64"),
    }

    match post::decode_post(payload) {
        Ok(xml) => {
            debug!("decoded message via plain base64");
            return Ok(xml);
        }
        Err(err) => debug!(error = %err, "plain base64 decode failed, trying raw XML"),
    }

    let trimmed = payload.trim_start();
    if trimmed.starts_with('<') {
        debug!("payload accepted as raw XML");
        return Ok(payload.to_string());
    }

    Err(SamlError::Decode(
        "payload is not deflated base64, plain base64, or XML".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{encode_post, encode_redirect};

    const XML: &str = r#"<samlp:AuthnRequest ID="_abc"/>"#;

    #[test]
    fn decodes_redirect_binding() {
        let encoded = encode_redirect(XML).unwrap();
        assert_eq!(decode_any(&encoded).unwrap(), XML);
    }

    #[test]
    fn decodes_post_binding() {
        let encoded = encode_post(XML);
        assert_eq!(decode_any(&encoded).unwrap(), XML);
    }

    #[test]
    fn accepts_raw_xml() {
        assert_eq!(decode_any(XML).unwrap(), XML);
        assert_eq!(decode_any("  <a/>").unwrap(), "  <a/>");
    }

    #[test]
    fn rejects_non_markup_plaintext() {
        let err = decode_any("hello world").unwrap_err();
        assert!(matches!(err, SamlError::Decode(_)));
    }

    #[test]
    fn base64_of_non_utf8_falls_through_to_error() {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        let encoded = STANDARD.encode([0xff, 0xfe, 0x00, 0x01]);
        assert!(decode_any(&encoded).is_err());
    }
}
