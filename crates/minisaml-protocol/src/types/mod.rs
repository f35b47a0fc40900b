//! SAML 2.0 message model.
//!
//! Structured representations of the protocol messages exchanged during
//! Web Browser SSO: the `AuthnRequest` an SP sends to an IdP, and the
//! `Response`/`Assertion` pair the IdP sends back. Messages are created
//! by the builder, serialized once, and never mutated afterwards.

mod assertion;
mod authn_request;
mod constants;
mod name_id;
mod response;
mod status;

pub use assertion::*;
pub use authn_request::*;
pub use constants::*;
pub use name_id::*;
pub use response::*;
pub use status::*;

/// Generates a fresh SAML message identifier.
///
/// XML `ID` attributes must not start with a digit, so every generated
/// identifier carries the conventional `_` prefix.
#[must_use]
pub fn generate_message_id() -> String {
    format!("_{}", uuid::Uuid::new_v4())
}
