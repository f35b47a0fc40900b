//! SAML message construction and XML serialization.
//!
//! Messages are serialized with string templates rather than a DOM: the
//! document shapes are fixed, only attribute and text values vary, and all
//! injected values pass through [`escape_xml`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SamlResult;
use crate::types::{
    Assertion, Attribute, AuthnRequest, NameId, NameIdFormat, Response, SAMLP_NS, SAML_NS,
};

/// Profile of an authenticated user, as produced by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable user identifier.
    pub id: String,

    /// Email address, also used as the assertion subject.
    pub email: String,

    /// Given name.
    #[serde(rename = "firstName")]
    pub first_name: String,

    /// Family name.
    #[serde(rename = "lastName")]
    pub last_name: String,

    /// Application role, if assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserProfile {
    /// Returns the display name, "firstName lastName".
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Escapes a value for interpolation into XML attribute or text positions.
#[must_use]
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Builds an AuthnRequest and its serialized XML document.
pub fn build_authn_request(
    issuer: &str,
    destination: &str,
    acs_url: &str,
    now: DateTime<Utc>,
) -> SamlResult<(AuthnRequest, String)> {
    let request = AuthnRequest::new(issuer, destination, acs_url, now)
        .with_name_id_format(NameIdFormat::Email);
    request.validate()?;
    let xml = serialize_authn_request(&request);
    Ok((request, xml))
}

fn serialize_authn_request(request: &AuthnRequest) -> String {
    let name_id_policy = request
        .name_id_format
        .as_deref()
        .map(|format| {
            format!(
                r#"
  <samlp:NameIDPolicy Format="{}" AllowCreate="true"/>"#,
                escape_xml(format)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:AuthnRequest xmlns:samlp="{samlp}" xmlns:saml="{saml}" ID="{id}" Version="{version}" IssueInstant="{instant}" Destination="{destination}" AssertionConsumerServiceURL="{acs}" ProtocolBinding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST">
  <saml:Issuer>{issuer}</saml:Issuer>{name_id_policy}
</samlp:AuthnRequest>"#,
        samlp = SAMLP_NS,
        saml = SAML_NS,
        id = escape_xml(&request.id),
        version = escape_xml(&request.version),
        instant = format_instant(request.issue_instant),
        destination = escape_xml(&request.destination),
        acs = escape_xml(&request.acs_url),
        issuer = escape_xml(&request.issuer),
    )
}

/// Inputs for building a SAML response.
#[derive(Debug, Clone)]
pub struct ResponseParams {
    /// Entity ID of the issuing IdP.
    pub idp_entity_id: String,

    /// SP entity ID the assertion is restricted to.
    pub sp_entity_id: String,

    /// ACS URL the response is addressed to.
    pub acs_url: String,

    /// ID of the AuthnRequest being answered, if solicited.
    pub in_response_to: Option<String>,
}

/// Builds a successful Response for an authenticated user and serializes it.
///
/// The assertion subject is the user's email; the attribute statement
/// carries `email`, `firstName`, `lastName`, `displayName`, and, when the
/// profile has one, `role`.
#[must_use]
pub fn build_response(
    params: &ResponseParams,
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> (Response, String) {
    let mut attributes = vec![
        Attribute::single("email", &profile.email),
        Attribute::single("firstName", &profile.first_name),
        Attribute::single("lastName", &profile.last_name),
        Attribute::single("displayName", profile.display_name()),
    ];
    if let Some(role) = &profile.role {
        attributes.push(Attribute::single("role", role));
    }
    let assertion = Assertion::new(
        &params.idp_entity_id,
        NameId::email(&profile.email),
        &params.sp_entity_id,
        &params.acs_url,
        params.in_response_to.clone(),
        now,
    )
    .with_attributes(attributes);
    let response = Response::success(
        &params.idp_entity_id,
        &params.acs_url,
        params.in_response_to.clone(),
        assertion,
        now,
    );
    let xml = serialize_response(&response);
    (response, xml)
}

fn serialize_response(response: &Response) -> String {
    let in_response_to = response
        .in_response_to
        .as_deref()
        .map(|id| format!(r#" InResponseTo="{}""#, escape_xml(id)))
        .unwrap_or_default();
    let assertion_xml = response
        .assertion()
        .map(serialize_assertion)
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:Response xmlns:samlp="{samlp}" xmlns:saml="{saml}" ID="{id}" Version="{version}" IssueInstant="{instant}" Destination="{destination}"{in_response_to}>
  <saml:Issuer>{issuer}</saml:Issuer>
  <samlp:Status>
    <samlp:StatusCode Value="{status}"/>
  </samlp:Status>
{assertion_xml}</samlp:Response>"#,
        samlp = SAMLP_NS,
        saml = SAML_NS,
        id = escape_xml(&response.id),
        version = escape_xml(&response.version),
        instant = format_instant(response.issue_instant),
        destination = escape_xml(&response.destination),
        issuer = escape_xml(&response.issuer),
        status = escape_xml(&response.status.code),
    )
}

fn serialize_assertion(assertion: &Assertion) -> String {
    let confirmation = &assertion.subject.confirmation;
    let in_response_to = confirmation
        .data
        .in_response_to
        .as_deref()
        .map(|id| format!(r#" InResponseTo="{}""#, escape_xml(id)))
        .unwrap_or_default();
    let name_id_format = assertion
        .subject
        .name_id
        .format
        .as_deref()
        .map(|format| format!(r#" Format="{}""#, escape_xml(format)))
        .unwrap_or_default();
    let attributes_xml = assertion
        .attribute_statement
        .as_ref()
        .map(|statement| {
            let body: String = statement
                .attributes
                .iter()
                .map(serialize_attribute)
                .collect();
            format!(
                "    <saml:AttributeStatement>\n{body}    </saml:AttributeStatement>\n"
            )
        })
        .unwrap_or_default();
    format!(
        r#"  <saml:Assertion ID="{id}" Version="2.0" IssueInstant="{instant}">
    <saml:Issuer>{issuer}</saml:Issuer>
    <saml:Subject>
      <saml:NameID{name_id_format}>{name_id}</saml:NameID>
      <saml:SubjectConfirmation Method="{method}">
        <saml:SubjectConfirmationData NotOnOrAfter="{confirm_not_after}" Recipient="{recipient}"{in_response_to}/>
      </saml:SubjectConfirmation>
    </saml:Subject>
    <saml:Conditions NotBefore="{not_before}" NotOnOrAfter="{not_after}">
      <saml:AudienceRestriction>
        <saml:Audience>{audience}</saml:Audience>
      </saml:AudienceRestriction>
    </saml:Conditions>
    <saml:AuthnStatement AuthnInstant="{authn_instant}" SessionNotOnOrAfter="{session_not_after}">
      <saml:AuthnContext>
        <saml:AuthnContextClassRef>{context_class}</saml:AuthnContextClassRef>
      </saml:AuthnContext>
    </saml:AuthnStatement>
{attributes_xml}  </saml:Assertion>
"#,
        id = escape_xml(&assertion.id),
        instant = format_instant(assertion.issue_instant),
        issuer = escape_xml(&assertion.issuer),
        name_id = escape_xml(&assertion.subject.name_id.value),
        method = escape_xml(&confirmation.method),
        confirm_not_after = format_instant(confirmation.data.not_on_or_after),
        recipient = escape_xml(&confirmation.data.recipient),
        not_before = format_instant(assertion.conditions.not_before),
        not_after = format_instant(assertion.conditions.not_on_or_after),
        audience = escape_xml(&assertion.conditions.audience),
        authn_instant = format_instant(assertion.authn_statement.authn_instant),
        session_not_after = format_instant(assertion.authn_statement.session_not_on_or_after),
        context_class = escape_xml(&assertion.authn_statement.context_class),
    )
}

fn serialize_attribute(attribute: &Attribute) -> String {
    let values: String = attribute
        .values
        .iter()
        .map(|value| {
            format!(
                "        <saml:AttributeValue>{}</saml:AttributeValue>\n",
                escape_xml(value)
            )
        })
        .collect();
    format!(
        "      <saml:Attribute Name=\"{}\">\n{values}      </saml:Attribute>\n",
        escape_xml(&attribute.name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile() -> UserProfile {
        UserProfile {
            id: "user123".to_string(),
            email: "user@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role: Some("user".to_string()),
        }
    }

    fn params() -> ResponseParams {
        ResponseParams {
            idp_entity_id: "http://localhost:7000/metadata".to_string(),
            sp_entity_id: "http://localhost:4000".to_string(),
            acs_url: "http://localhost:4000/callback".to_string(),
            in_response_to: Some("_req1".to_string()),
        }
    }

    #[test]
    fn authn_request_xml_carries_required_attributes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let (request, xml) = build_authn_request(
            "http://localhost:4000",
            "http://localhost:7000/login",
            "http://localhost:4000/callback",
            now,
        )
        .unwrap();
        assert!(xml.contains(&format!(r#"ID="{}""#, request.id)));
        assert!(xml.contains(r#"Version="2.0""#));
        assert!(xml.contains(r#"IssueInstant="2024-01-15T12:00:00Z""#));
        assert!(xml.contains(r#"Destination="http://localhost:7000/login""#));
        assert!(xml.contains(
            r#"AssertionConsumerServiceURL="http://localhost:4000/callback""#
        ));
        assert!(xml.contains("<saml:Issuer>http://localhost:4000</saml:Issuer>"));
        assert!(xml.contains("samlp:NameIDPolicy"));
    }

    #[test]
    fn response_window_is_five_minutes_in_both_places() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let (_, xml) = build_response(&params(), &profile(), now);
        // Conditions and SubjectConfirmationData share the same expiry.
        assert_eq!(xml.matches("2024-01-15T12:05:00Z").count(), 3);
        assert!(xml.contains(r#"NotBefore="2024-01-15T12:00:00Z""#));
    }

    #[test]
    fn response_attributes_include_display_name_and_role() {
        let (_, xml) = build_response(&params(), &profile(), Utc::now());
        assert!(xml.contains(r#"<saml:Attribute Name="email">"#));
        assert!(xml.contains("<saml:AttributeValue>user@example.com</saml:AttributeValue>"));
        assert!(xml.contains(r#"<saml:Attribute Name="displayName">"#));
        assert!(xml.contains("<saml:AttributeValue>Test User</saml:AttributeValue>"));
        assert!(xml.contains(r#"<saml:Attribute Name="role">"#));
    }

    #[test]
    fn response_omits_role_attribute_when_unset() {
        let mut profile = profile();
        profile.role = None;
        let (_, xml) = build_response(&params(), &profile, Utc::now());
        assert!(!xml.contains(r#"Name="role""#));
    }

    #[test]
    fn response_correlates_in_response_to() {
        let (response, xml) = build_response(&params(), &profile(), Utc::now());
        assert_eq!(response.in_response_to.as_deref(), Some("_req1"));
        // Response element and SubjectConfirmationData both carry it.
        assert_eq!(xml.matches(r#"InResponseTo="_req1""#).count(), 2);
    }

    #[test]
    fn unsolicited_response_omits_in_response_to() {
        let mut params = params();
        params.in_response_to = None;
        let (_, xml) = build_response(&params, &profile(), Utc::now());
        assert!(!xml.contains("InResponseTo"));
    }

    #[test]
    fn xml_escaping_covers_injected_values() {
        let mut profile = profile();
        profile.first_name = r#"<script>"x"&'y'</script>"#.to_string();
        let (_, xml) = build_response(&params(), &profile, Utc::now());
        assert!(!xml.contains("<script>"));
        assert!(xml.contains("&lt;script&gt;&quot;x&quot;&amp;&apos;y&apos;&lt;/script&gt;"));
    }
}
