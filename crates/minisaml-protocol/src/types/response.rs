//! SAML Response type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_message_id, Assertion, Status};

/// SAML response an IdP sends back to an SP's assertion consumer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Unique response identifier.
    pub id: String,

    /// SAML version, always "2.0".
    pub version: String,

    /// Time the response was issued.
    pub issue_instant: DateTime<Utc>,

    /// Entity ID of the issuing IdP.
    pub issuer: String,

    /// ACS URL this response is addressed to.
    pub destination: String,

    /// ID of the AuthnRequest this response answers, if solicited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Outcome of the request.
    pub status: Status,

    /// The issued assertion, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion: Option<Assertion>,
}

impl Response {
    /// Creates a successful response carrying `assertion`, issued at `now`.
    #[must_use]
    pub fn success(
        issuer: impl Into<String>,
        destination: impl Into<String>,
        in_response_to: Option<String>,
        assertion: Assertion,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_message_id(),
            version: "2.0".to_string(),
            issue_instant: now,
            issuer: issuer.into(),
            destination: destination.into(),
            in_response_to,
            status: Status::success(),
            assertion: Some(assertion),
        }
    }

    /// Returns the assertion, if the response carries one.
    #[must_use]
    pub fn assertion(&self) -> Option<&Assertion> {
        self.assertion.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NameId;

    #[test]
    fn success_response_carries_assertion_and_correlation() {
        let now = Utc::now();
        let assertion = Assertion::new(
            "http://localhost:7000/metadata",
            NameId::email("user@example.com"),
            "http://localhost:4000",
            "http://localhost:4000/callback",
            Some("_req1".to_string()),
            now,
        );
        let response = Response::success(
            "http://localhost:7000/metadata",
            "http://localhost:4000/callback",
            Some("_req1".to_string()),
            assertion,
            now,
        );
        assert!(response.status.is_success());
        assert_eq!(response.in_response_to.as_deref(), Some("_req1"));
        assert_eq!(response.version, "2.0");
        assert!(response.assertion().is_some());
    }
}
