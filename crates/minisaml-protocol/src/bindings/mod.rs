//! SAML binding codecs.
//!
//! The HTTP-Redirect binding carries raw-deflated, base64-encoded XML in a
//! URL query parameter; the HTTP-POST binding carries plain base64-encoded
//! XML in a form field. Decoding is tolerant: [`decode::decode_any`] tries
//! each wire format in turn and only fails once every strategy has been
//! exhausted.

pub mod decode;
pub mod post;
pub mod redirect;

pub use decode::decode_any;
pub use post::{decode_post, encode_post};
pub use redirect::{decode_redirect, encode_redirect};

/// Which protocol message a query or form parameter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// A `SAMLRequest` parameter (AuthnRequest).
    Request,
    /// A `SAMLResponse` parameter (Response).
    Response,
}

impl SamlMessageType {
    /// Returns the query/form parameter name for this message type.
    #[must_use]
    pub const fn param_name(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}
