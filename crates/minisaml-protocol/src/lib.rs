//! SAML 2.0 Web Browser SSO protocol engine.
//!
//! Everything needed to run both sides of an SP-initiated SSO exchange:
//! a message model, the HTTP-Redirect and HTTP-POST binding codecs, XML
//! construction and field extraction, an issuer-keyed service provider
//! registry, and orchestration functions tying them together. The crate is
//! synchronous and transport-agnostic; HTTP delivery lives in the server.
//!
//! Messages are issued unsigned and verification is governed by
//! [`parser::SignatureVerificationPolicy`], which defaults to disabled.

#![forbid(unsafe_code)]

pub mod bindings;
pub mod builder;
pub mod error;
pub mod exchange;
pub mod parser;
pub mod registry;
pub mod types;

pub use bindings::{decode_any, SamlMessageType};
pub use builder::{build_authn_request, build_response, ResponseParams, UserProfile};
pub use error::{SamlError, SamlResult};
pub use exchange::{
    complete_login, consume_login_response, initiate_login, review_login_request,
    LoginCompletion, LoginRedirect, LoginReview, LoginSession, OutstandingRequests,
};
pub use parser::{
    parse_authn_request, parse_response, AuthnRequestSummary, ResponseSummary,
    SignatureVerificationPolicy,
};
pub use registry::{ServiceProviderRecord, SpRegistry};
