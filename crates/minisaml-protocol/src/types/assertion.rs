//! SAML assertion types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{confirmation_methods, generate_message_id, AuthnContextClass, NameId};

/// How long an issued assertion stays valid.
pub const ASSERTION_VALIDITY_MINUTES: i64 = 5;

/// SAML assertion carrying the authenticated subject and its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique assertion identifier.
    pub id: String,

    /// Time the assertion was issued.
    pub issue_instant: DateTime<Utc>,

    /// Entity ID of the issuing IdP.
    pub issuer: String,

    /// The authenticated subject.
    pub subject: Subject,

    /// Validity window and audience restriction.
    pub conditions: Conditions,

    /// Statement about the authentication event.
    pub authn_statement: AuthnStatement,

    /// Attributes describing the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_statement: Option<AttributeStatement>,
}

/// Assertion subject with bearer confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// The subject's name ID.
    pub name_id: NameId,

    /// Bearer confirmation tying the assertion to the SSO exchange.
    pub confirmation: SubjectConfirmation,
}

/// Subject confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfirmation {
    /// Confirmation method URI.
    pub method: String,

    /// Confirmation constraints.
    pub data: SubjectConfirmationData,
}

/// Constraints on subject confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfirmationData {
    /// Latest time the confirmation may be used.
    pub not_on_or_after: DateTime<Utc>,

    /// ACS URL the response must be delivered to.
    pub recipient: String,

    /// Request ID this assertion answers, if solicited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,
}

/// Assertion validity window and audience restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    /// Earliest time the assertion is valid.
    pub not_before: DateTime<Utc>,

    /// Time the assertion expires.
    pub not_on_or_after: DateTime<Utc>,

    /// SP entity ID this assertion is restricted to.
    pub audience: String,
}

impl Conditions {
    /// Creates conditions for an assertion issued at `now`, valid for
    /// the standard five-minute window.
    #[must_use]
    pub fn standard_window(now: DateTime<Utc>, audience: impl Into<String>) -> Self {
        Self {
            not_before: now,
            not_on_or_after: now + Duration::minutes(ASSERTION_VALIDITY_MINUTES),
            audience: audience.into(),
        }
    }
}

/// Statement about the authentication event itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnStatement {
    /// Time authentication occurred.
    pub authn_instant: DateTime<Utc>,

    /// Session expiry, aligned with the assertion window.
    pub session_not_on_or_after: DateTime<Utc>,

    /// Authentication context class URI.
    pub context_class: String,
}

/// Collection of subject attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// Attributes in emission order.
    pub attributes: Vec<Attribute>,
}

/// A single named attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,

    /// Attribute values.
    pub values: Vec<String>,
}

impl Attribute {
    /// Creates a single-valued attribute.
    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }
}

impl Assertion {
    /// Creates an assertion issued at `now` for a bearer subject.
    ///
    /// The conditions, subject confirmation, and session expiry all share
    /// the same five-minute window measured from `now`.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        name_id: NameId,
        audience: impl Into<String>,
        recipient: impl Into<String>,
        in_response_to: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let conditions = Conditions::standard_window(now, audience);
        let not_on_or_after = conditions.not_on_or_after;
        Self {
            id: generate_message_id(),
            issue_instant: now,
            issuer: issuer.into(),
            subject: Subject {
                name_id,
                confirmation: SubjectConfirmation {
                    method: confirmation_methods::BEARER.to_string(),
                    data: SubjectConfirmationData {
                        not_on_or_after,
                        recipient: recipient.into(),
                        in_response_to,
                    },
                },
            },
            conditions,
            authn_statement: AuthnStatement {
                authn_instant: now,
                session_not_on_or_after: not_on_or_after,
                context_class: AuthnContextClass::Password.uri().to_string(),
            },
            attribute_statement: None,
        }
    }

    /// Attaches an attribute statement.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attribute_statement = Some(AttributeStatement { attributes });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_window_is_exactly_five_minutes() {
        let now = Utc::now();
        let assertion = Assertion::new(
            "http://localhost:7000/metadata",
            NameId::email("user@example.com"),
            "http://localhost:4000",
            "http://localhost:4000/callback",
            Some("_req1".to_string()),
            now,
        );
        let expected = now + Duration::minutes(5);
        assert_eq!(assertion.conditions.not_on_or_after, expected);
        assert_eq!(
            assertion.subject.confirmation.data.not_on_or_after,
            expected
        );
        assert_eq!(assertion.authn_statement.session_not_on_or_after, expected);
        assert_eq!(assertion.conditions.not_before, now);
    }

    #[test]
    fn bearer_confirmation_carries_recipient_and_correlation() {
        let assertion = Assertion::new(
            "http://localhost:7000/metadata",
            NameId::email("user@example.com"),
            "http://localhost:4000",
            "http://localhost:4000/callback",
            Some("_req1".to_string()),
            Utc::now(),
        );
        let confirmation = &assertion.subject.confirmation;
        assert_eq!(confirmation.method, "urn:oasis:names:tc:SAML:2.0:cm:bearer");
        assert_eq!(confirmation.data.recipient, "http://localhost:4000/callback");
        assert_eq!(confirmation.data.in_response_to.as_deref(), Some("_req1"));
    }

    #[test]
    fn attribute_statement_preserves_order() {
        let assertion = Assertion::new(
            "idp",
            NameId::new("user123"),
            "sp",
            "http://localhost:4000/callback",
            None,
            Utc::now(),
        )
        .with_attributes(vec![
            Attribute::single("email", "user@example.com"),
            Attribute::single("firstName", "Test"),
            Attribute::single("lastName", "User"),
        ]);
        let statement = assertion.attribute_statement.as_ref().unwrap();
        let names: Vec<&str> = statement.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["email", "firstName", "lastName"]);
    }
}
