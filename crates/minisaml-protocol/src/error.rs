//! SAML error types.
//!
//! One error enum covers the whole exchange: binding decode, XML parsing,
//! registry lookup, and authentication outcomes reported by the credential
//! collaborator.

use thiserror::Error;

use crate::types::status_codes;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Invalid SAML request format or content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// All binding-decode strategies were exhausted without a usable payload.
    #[error("unable to decode SAML message: {0}")]
    Decode(String),

    /// Decoded payload is not a well-formed XML document.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// Issuer is not present in the service provider registry.
    #[error("unknown service provider: {0}")]
    UnknownServiceProvider(String),

    /// Signature requirements not met.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Replayed or unsolicited correlation identifier.
    #[error("stale or unknown InResponseTo: {0}")]
    StaleResponse(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SamlError {
    /// Returns the SAML status code for this error.
    #[must_use]
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_)
            | Self::Decode(_)
            | Self::XmlParse(_)
            | Self::MissingElement(_)
            | Self::SignatureInvalid(_)
            | Self::StaleResponse(_) => status_codes::REQUESTER,
            Self::AuthenticationFailed(_) => status_codes::AUTHN_FAILED,
            Self::UnknownServiceProvider(_) => status_codes::UNKNOWN_PRINCIPAL,
            Self::Internal(_) => status_codes::RESPONDER,
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Hard failures (malformed wire data) and soft failures (unknown
    /// issuer) are both 400; only credential mismatches are 401.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_)
            | Self::Decode(_)
            | Self::XmlParse(_)
            | Self::MissingElement(_)
            | Self::UnknownServiceProvider(_)
            | Self::StaleResponse(_) => 400,
            Self::SignatureInvalid(_) | Self::AuthenticationFailed(_) => 401,
            Self::Internal(_) => 500,
        }
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
