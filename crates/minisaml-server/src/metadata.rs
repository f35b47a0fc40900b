//! SAML metadata descriptors.
//!
//! Generates the IdP and SP entity descriptors served from each side's
//! `/metadata` endpoint. Certificates are optional; when a PEM file is
//! configured its armor is stripped and the base64 body embedded as a
//! `KeyDescriptor`.

use anyhow::{Context, Result};

use minisaml_protocol::builder::escape_xml;
use minisaml_protocol::types::{NameIdFormat, SamlBinding, SAML_MD_NS};

/// Reads a PEM file and strips its armor lines, leaving the base64 body.
pub fn load_cert_body(path: &str) -> Result<String> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("reading certificate {path}"))?;
    Ok(strip_pem_armor(&pem))
}

/// Strips PEM BEGIN/END armor and whitespace from a certificate.
#[must_use]
pub fn strip_pem_armor(pem: &str) -> String {
    pem.lines()
        .filter(|line| !line.starts_with("-----"))
        .map(str::trim)
        .collect()
}

fn key_descriptor(cert_body: Option<&str>) -> String {
    cert_body
        .map(|body| {
            format!(
                r#"
  <md:KeyDescriptor use="signing">
    <ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
      <ds:X509Data>
        <ds:X509Certificate>{}</ds:X509Certificate>
      </ds:X509Data>
    </ds:KeyInfo>
  </md:KeyDescriptor>"#,
                escape_xml(body)
            )
        })
        .unwrap_or_default()
}

/// Renders the IdP entity descriptor.
#[must_use]
pub fn idp_descriptor(entity_id: &str, login_url: &str, cert_body: Option<&str>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="{md}" entityID="{entity_id}">
<md:IDPSSODescriptor WantAuthnRequestsSigned="false" protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">{keys}
  <md:NameIDFormat>{name_id_format}</md:NameIDFormat>
  <md:SingleSignOnService Binding="{redirect_binding}" Location="{login_url}"/>
  <md:SingleSignOnService Binding="{post_binding}" Location="{login_url}"/>
</md:IDPSSODescriptor>
</md:EntityDescriptor>"#,
        md = SAML_MD_NS,
        entity_id = escape_xml(entity_id),
        keys = key_descriptor(cert_body),
        name_id_format = NameIdFormat::Email.uri(),
        redirect_binding = SamlBinding::HttpRedirect.uri(),
        post_binding = SamlBinding::HttpPost.uri(),
        login_url = escape_xml(login_url),
    )
}

/// Renders the SP entity descriptor.
#[must_use]
pub fn sp_descriptor(entity_id: &str, acs_url: &str, cert_body: Option<&str>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="{md}" entityID="{entity_id}">
<md:SPSSODescriptor AuthnRequestsSigned="false" WantAssertionsSigned="false" protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">{keys}
  <md:NameIDFormat>{name_id_format}</md:NameIDFormat>
  <md:AssertionConsumerService Binding="{post_binding}" Location="{acs_url}" index="0" isDefault="true"/>
</md:SPSSODescriptor>
</md:EntityDescriptor>"#,
        md = SAML_MD_NS,
        entity_id = escape_xml(entity_id),
        keys = key_descriptor(cert_body),
        name_id_format = NameIdFormat::Email.uri(),
        post_binding = SamlBinding::HttpPost.uri(),
        acs_url = escape_xml(acs_url),
    )
}
