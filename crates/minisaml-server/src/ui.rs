//! Browser-facing HTML pages.
//!
//! The IdP login form and the shared error page. Pages are rendered with
//! string templates; every request-derived value is HTML-escaped before
//! interpolation.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use minisaml_protocol::bindings::post::escape_html;
use minisaml_protocol::SamlError;

/// Protocol error as an HTTP response: the mapped status code with the
/// rendered error page as the body.
pub struct SamlFailure(pub SamlError);

impl From<SamlError> for SamlFailure {
    fn from(err: SamlError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SamlFailure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::warn!(error = %self.0, status = %status, "request failed");
        (status, Html(error_page(&self.0))).into_response()
    }
}

/// Renders the IdP login form.
///
/// The incoming `SAMLRequest` payload and `RelayState` ride along as
/// hidden fields so the POST handler can resume the exchange after the
/// credentials are checked.
#[must_use]
pub fn login_page(saml_request: &str, relay_state: Option<&str>, error: Option<&str>) -> String {
    let error_banner = error
        .map(|message| {
            format!(
                r#"<p class="error">{}</p>"#,
                escape_html(message)
            )
        })
        .unwrap_or_default();
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
<head>
<title>Sign in</title>
<style>
body {{ font-family: sans-serif; max-width: 24rem; margin: 4rem auto; }}
label {{ display: block; margin-top: 1rem; }}
input {{ width: 100%; padding: 0.4rem; }}
button {{ margin-top: 1.5rem; padding: 0.5rem 1.5rem; }}
.error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>Sign in</h1>
{error_banner}
<form method="post" action="/login">
<input type="hidden" name="SAMLRequest" value="{saml_request}"/>
{relay_field}
<label>Email <input type="email" name="email" value="user@example.com"/></label>
<label>Password <input type="password" name="password"/></label>
<button type="submit">Sign in</button>
</form>
</body>
</html>"#,
        saml_request = escape_html(saml_request),
    )
}

/// Renders the error page shown when an exchange cannot continue.
#[must_use]
pub fn error_page(error: &SamlError) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>SAML Error</title></head>
<body>
<h1>SAML Error</h1>
<p>{message}</p>
<p><code>{status_code}</code></p>
</body>
</html>"#,
        message = escape_html(&error.to_string()),
        status_code = escape_html(error.status_code()),
    )
}
