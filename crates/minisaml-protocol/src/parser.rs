//! SAML message parsing and field extraction.
//!
//! Parsing is extraction-oriented: the handlers need a handful of fields
//! (request ID, issuer, ACS URL, subject, attributes), not a full document
//! model, so the parser walks quick-xml events and picks out what it needs.
//! Absent fields are `None`, never errors; only a document with no root
//! element fails.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::error::{SamlError, SamlResult};

/// Cap on accepted XML documents.
const MAX_XML_SIZE: usize = 1024 * 1024;

/// Whether XML signatures on incoming messages are required.
///
/// The demo profile issues unsigned messages, so verification is
/// configured off rather than patched out of the validation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureVerificationPolicy {
    /// Signatures are required and verified.
    Enforced,
    /// Signatures are not required; unsigned messages are accepted.
    #[default]
    Disabled,
}

impl SignatureVerificationPolicy {
    /// Checks an incoming document against this policy.
    ///
    /// With verification disabled every document passes. Enforcement
    /// requires a `Signature` element to be present; cryptographic
    /// verification of its contents is out of scope here.
    pub fn check(&self, xml: &str) -> SamlResult<()> {
        match self {
            Self::Disabled => Ok(()),
            Self::Enforced => {
                if xml.contains("<ds:Signature") || xml.contains("<Signature") {
                    Ok(())
                } else {
                    Err(SamlError::SignatureInvalid(
                        "message is not signed".to_string(),
                    ))
                }
            }
        }
    }
}

/// Fields extracted from an AuthnRequest document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthnRequestSummary {
    /// The request's `ID` attribute, taken from the root element only.
    pub request_id: Option<String>,

    /// SP entity ID from the `Issuer` element.
    pub issuer: Option<String>,

    /// `AssertionConsumerServiceURL` attribute from the root element.
    pub acs_url: Option<String>,
}

/// Fields extracted from a Response document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSummary {
    /// Subject `NameID` text.
    pub name_id: Option<String>,

    /// `InResponseTo` attribute from the root element.
    pub in_response_to: Option<String>,

    /// IdP entity ID from the `Issuer` element.
    pub issuer: Option<String>,

    /// Status code URI from the `StatusCode` element.
    pub status_code: Option<String>,

    /// Attributes in document order, as (name, first value) pairs.
    pub attributes: Vec<(String, String)>,
}

impl ResponseSummary {
    /// Looks up an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn check_size(xml: &str) -> SamlResult<()> {
    if xml.len() > MAX_XML_SIZE {
        return Err(SamlError::XmlParse("document too large".to_string()));
    }
    Ok(())
}

/// Parses an AuthnRequest document into its summary.
///
/// The `ID` and `AssertionConsumerServiceURL` attributes are read from the
/// root element only; identically-named attributes deeper in the document
/// are ignored.
pub fn parse_authn_request(xml: &str) -> SamlResult<AuthnRequestSummary> {
    check_size(xml)?;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut summary = AuthnRequestSummary::default();
    let mut saw_root = false;
    let mut depth = 0usize;
    let mut in_issuer = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let qname = e.local_name();
                let name = local_name(qname.as_ref());
                if depth == 1 {
                    saw_root = true;
                    summary.request_id = attribute_value(&e, b"ID")?;
                    summary.acs_url = attribute_value(&e, b"AssertionConsumerServiceURL")?;
                } else if name == "Issuer" && summary.issuer.is_none() {
                    in_issuer = true;
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    saw_root = true;
                    summary.request_id = attribute_value(&e, b"ID")?;
                    summary.acs_url = attribute_value(&e, b"AssertionConsumerServiceURL")?;
                    break;
                }
            }
            Event::Text(text) => {
                if in_issuer {
                    let value = text
                        .unescape()
                        .map_err(|e| SamlError::XmlParse(e.to_string()))?;
                    summary.issuer = Some(value.into_owned());
                }
            }
            Event::End(_) => {
                in_issuer = false;
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(SamlError::XmlParse("document has no root element".to_string()));
    }
    debug!(
        request_id = ?summary.request_id,
        issuer = ?summary.issuer,
        "parsed authentication request"
    );
    Ok(summary)
}

/// Parses a Response document into its summary.
///
/// Extraction never fails: missing fields yield `None`s and an empty
/// attribute list, and when the document is not well-formed enough for a
/// structured walk, a degraded text scan recovers the NameID, the
/// correlation ID, and the core attributes.
pub fn parse_response(xml: &str) -> SamlResult<ResponseSummary> {
    check_size(xml)?;
    match parse_response_structured(xml) {
        Ok(summary) => Ok(summary),
        Err(err) => {
            debug!(error = %err, "structured response parse failed, falling back to text scan");
            Ok(scan_response(xml))
        }
    }
}

fn parse_response_structured(xml: &str) -> SamlResult<ResponseSummary> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut summary = ResponseSummary::default();
    let mut saw_root = false;
    let mut depth = 0usize;
    let mut in_name_id = false;
    let mut in_issuer = false;
    let mut in_attribute_value = false;
    let mut current_attribute: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let qname = e.local_name();
                let name = local_name(qname.as_ref());
                if depth == 1 {
                    saw_root = true;
                    summary.in_response_to = attribute_value(&e, b"InResponseTo")?;
                }
                match name {
                    "NameID" if summary.name_id.is_none() => in_name_id = true,
                    "Issuer" if summary.issuer.is_none() => in_issuer = true,
                    "Attribute" => {
                        current_attribute = attribute_value(&e, b"Name")?;
                    }
                    "AttributeValue" if current_attribute.is_some() => {
                        in_attribute_value = true;
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    saw_root = true;
                    summary.in_response_to = attribute_value(&e, b"InResponseTo")?;
                    break;
                }
                let qname = e.local_name();
                let name = local_name(qname.as_ref());
                if name == "StatusCode" && summary.status_code.is_none() {
                    summary.status_code = attribute_value(&e, b"Value")?;
                }
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| SamlError::XmlParse(e.to_string()))?;
                if in_name_id {
                    summary.name_id = Some(value.into_owned());
                } else if in_issuer {
                    summary.issuer = Some(value.into_owned());
                } else if in_attribute_value {
                    if let Some(name) = current_attribute.take() {
                        summary.attributes.push((name, value.into_owned()));
                    }
                }
            }
            Event::End(e) => {
                let qname = e.local_name();
                let name = local_name(qname.as_ref());
                match name {
                    "NameID" => in_name_id = false,
                    "Issuer" => in_issuer = false,
                    "AttributeValue" => in_attribute_value = false,
                    "Attribute" => current_attribute = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(SamlError::XmlParse("document has no root element".to_string()));
    }
    debug!(
        name_id = ?summary.name_id,
        in_response_to = ?summary.in_response_to,
        attribute_count = summary.attributes.len(),
        "parsed SAML response"
    );
    Ok(summary)
}

/// Best-effort recovery of response fields from a document the event
/// reader could not walk.
fn scan_response(xml: &str) -> ResponseSummary {
    let mut summary = ResponseSummary {
        name_id: scan_element_text(xml, "NameID"),
        in_response_to: scan_attribute(xml, "InResponseTo"),
        issuer: scan_element_text(xml, "Issuer"),
        status_code: None,
        attributes: Vec::new(),
    };
    for name in ["email", "firstName", "lastName", "displayName", "role"] {
        if let Some(value) = scan_named_attribute(xml, name) {
            summary.attributes.push((name.to_string(), value));
        }
    }
    summary
}

fn scan_element_text(xml: &str, element: &str) -> Option<String> {
    let mut search = 0;
    while let Some(found) = xml[search..].find(element) {
        let pos = search + found;
        search = pos + element.len();
        let before = &xml[..pos];
        if !(before.ends_with('<') || before.ends_with(':')) {
            continue;
        }
        let Some(close) = xml[pos..].find('>') else {
            return None;
        };
        let tag_end = pos + close;
        if xml[pos..tag_end].ends_with('/') {
            continue;
        }
        let text_start = tag_end + 1;
        if let Some(text_end) = xml[text_start..].find('<') {
            let text = xml[text_start..text_start + text_end].trim();
            if !text.is_empty() {
                return Some(unescape_xml(text));
            }
        }
    }
    None
}

fn scan_attribute(xml: &str, attribute: &str) -> Option<String> {
    let marker = format!("{attribute}=\"");
    let start = xml.find(&marker)? + marker.len();
    let end = xml[start..].find('"')?;
    Some(unescape_xml(&xml[start..start + end]))
}

fn scan_named_attribute(xml: &str, name: &str) -> Option<String> {
    let marker = format!("Name=\"{name}\"");
    let after = xml.find(&marker)? + marker.len();
    scan_element_text(&xml[after..], "AttributeValue")
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn local_name(name: &[u8]) -> &str {
    std::str::from_utf8(name).unwrap_or("")
}

fn attribute_value(
    element: &quick_xml::events::BytesStart<'_>,
    name: &[u8],
) -> SamlResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| SamlError::XmlParse(e.to_string()))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| SamlError::XmlParse(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
