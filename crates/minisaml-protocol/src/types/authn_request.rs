//! SAML AuthnRequest type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_message_id, NameIdFormat};
use crate::error::{SamlError, SamlResult};

/// Authentication request an SP sends to an IdP.
///
/// Built once, serialized once. The `id` is recorded by the SP so the
/// eventual response's `InResponseTo` can be correlated against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Unique request identifier.
    pub id: String,

    /// SAML version, always "2.0".
    pub version: String,

    /// Time the request was issued.
    pub issue_instant: DateTime<Utc>,

    /// Entity ID of the requesting SP.
    pub issuer: String,

    /// IdP single sign-on endpoint this request is addressed to.
    pub destination: String,

    /// Assertion Consumer Service URL the response should be posted to.
    pub acs_url: String,

    /// Requested name ID format, emitted as a NameIDPolicy when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_format: Option<String>,
}

impl AuthnRequest {
    /// Creates an authentication request issued at `now`.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        destination: impl Into<String>,
        acs_url: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_message_id(),
            version: "2.0".to_string(),
            issue_instant: now,
            issuer: issuer.into(),
            destination: destination.into(),
            acs_url: acs_url.into(),
            name_id_format: None,
        }
    }

    /// Sets the requested name ID format.
    #[must_use]
    pub fn with_name_id_format(mut self, format: NameIdFormat) -> Self {
        self.name_id_format = Some(format.uri().to_string());
        self
    }

    /// Validates required fields before serialization.
    pub fn validate(&self) -> SamlResult<()> {
        if self.issuer.is_empty() {
            return Err(SamlError::InvalidRequest("missing issuer".to_string()));
        }
        if self.acs_url.is_empty() {
            return Err(SamlError::InvalidRequest(
                "missing assertion consumer service URL".to_string(),
            ));
        }
        if self.version != "2.0" {
            return Err(SamlError::InvalidRequest(format!(
                "unsupported SAML version: {}",
                self.version
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AuthnRequest {
        AuthnRequest::new(
            "http://localhost:4000",
            "http://localhost:7000/login",
            "http://localhost:4000/callback",
            Utc::now(),
        )
    }

    #[test]
    fn new_request_is_valid() {
        let req = request();
        assert!(req.validate().is_ok());
        assert_eq!(req.version, "2.0");
        assert!(req.id.starts_with('_'));
    }

    #[test]
    fn validation_rejects_empty_issuer() {
        let mut req = request();
        req.issuer.clear();
        assert!(matches!(
            req.validate(),
            Err(SamlError::InvalidRequest(_))
        ));
    }

    #[test]
    fn name_id_format_policy() {
        let req = request().with_name_id_format(NameIdFormat::Email);
        assert_eq!(
            req.name_id_format.as_deref(),
            Some("urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress")
        );
    }
}
