//! HTTP-POST binding codec.
//!
//! Encodes XML as plain standard base64 carried in a form field, delivered
//! to the browser as an auto-submitting HTML form.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{SamlError, SamlResult};

use super::SamlMessageType;

/// Encodes an XML document for the HTTP-POST binding.
#[must_use]
pub fn encode_post(xml: &str) -> String {
    BASE64.encode(xml)
}

/// Decodes an HTTP-POST binding payload back to XML.
pub fn decode_post(encoded: &str) -> SamlResult<String> {
    let bytes = BASE64.decode(encoded.trim())?;
    String::from_utf8(bytes).map_err(|e| SamlError::Decode(format!("payload is not UTF-8: {e}")))
}

/// Renders the auto-submitting form page that delivers a POST-bound message
/// through the browser.
///
/// All injected values are HTML-escaped; the base64 payload itself is safe
/// but the relay state and action URL come from the request.
#[must_use]
pub fn auto_submit_form(
    action_url: &str,
    message_type: SamlMessageType,
    encoded: &str,
    relay_state: Option<&str>,
) -> String {
    let relay_field = relay_state
        .map(|rs| {
            format!(
                r#"<input type="hidden" name="RelayState" value="{}"/>"#,
                escape_html(rs)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Continue</title></head>
<body onload="document.forms[0].submit()">
<noscript><p>JavaScript is disabled. Click the button to continue.</p></noscript>
<form method="post" action="{action}">
<input type="hidden" name="{param}" value="{value}"/>
{relay_field}
<noscript><input type="submit" value="Continue"/></noscript>
</form>
</body>
</html>"#,
        action = escape_html(action_url),
        param = message_type.param_name(),
        value = escape_html(encoded),
    )
}

/// Escapes a value for interpolation into HTML attribute or text positions.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
