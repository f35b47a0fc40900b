//! SAML Name ID type.

use serde::{Deserialize, Serialize};

use super::NameIdFormat;

/// Identifier of a subject in a SAML assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The identifier value.
    pub value: String,

    /// Format URI qualifying the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl NameId {
    /// Creates a name ID with no declared format.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
        }
    }

    /// Creates an email-format name ID.
    #[must_use]
    pub fn email(email: impl Into<String>) -> Self {
        Self::new(email).with_format(NameIdFormat::Email)
    }

    /// Sets the format.
    #[must_use]
    pub fn with_format(mut self, format: NameIdFormat) -> Self {
        self.format = Some(format.uri().to_string());
        self
    }

    /// Returns the parsed format, defaulting to unspecified.
    #[must_use]
    pub fn parsed_format(&self) -> NameIdFormat {
        self.format
            .as_deref()
            .and_then(NameIdFormat::from_uri)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_name_id() {
        let name_id = NameId::email("user@example.com");
        assert_eq!(name_id.value, "user@example.com");
        assert_eq!(name_id.parsed_format(), NameIdFormat::Email);
    }

    #[test]
    fn unknown_format_falls_back_to_unspecified() {
        let mut name_id = NameId::new("someone");
        name_id.format = Some("urn:example:custom".to_string());
        assert_eq!(name_id.parsed_format(), NameIdFormat::Unspecified);
    }
}
