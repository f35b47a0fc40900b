//! SSO exchange orchestration.
//!
//! Pure functions that tie the codec, parser, builder, and registry into
//! the two halves of the Web Browser SSO exchange. Each returns a value
//! describing the next protocol step; delivering it over HTTP is the
//! server's job.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::bindings::{self, SamlMessageType};
use crate::builder::{self, ResponseParams, UserProfile};
use crate::error::{SamlError, SamlResult};
use crate::parser::{self, SignatureVerificationPolicy};
use crate::registry::SpRegistry;
use crate::types::{AuthnRequest, ASSERTION_VALIDITY_MINUTES};

/// An SP-initiated login, ready to send to the IdP.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    /// The request that was issued; its `id` must be recorded for
    /// correlation against the eventual response.
    pub request: AuthnRequest,

    /// Redirect-binding URL the browser should be sent to.
    pub url: String,
}

/// Starts an SP-initiated login.
///
/// Builds an AuthnRequest and wraps it in an HTTP-Redirect binding URL.
pub fn initiate_login(
    sp_entity_id: &str,
    idp_login_url: &str,
    acs_url: &str,
    relay_state: Option<&str>,
    now: DateTime<Utc>,
) -> SamlResult<LoginRedirect> {
    let (request, xml) = builder::build_authn_request(sp_entity_id, idp_login_url, acs_url, now)?;
    let url = bindings::redirect::redirect_url(
        idp_login_url,
        SamlMessageType::Request,
        &xml,
        relay_state,
    )?;
    info!(request_id = %request.id, issuer = %request.issuer, "initiated login");
    Ok(LoginRedirect { request, url })
}

/// An incoming AuthnRequest the IdP has accepted for login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginReview {
    /// SP entity ID, resolved against the registry.
    pub sp_entity_id: String,

    /// ACS URL the response must be posted to, taken from the registry
    /// record rather than the request.
    pub acs_url: String,

    /// Request ID to echo back as `InResponseTo`, when the request had one.
    pub in_response_to: Option<String>,
}

/// Reviews an incoming `SAMLRequest` payload on the IdP side.
///
/// Decodes the payload, extracts the issuer, checks the signature policy,
/// and routes the issuer through the registry. The ACS URL always comes
/// from the registration, never from the request document.
pub fn review_login_request(
    payload: &str,
    registry: &SpRegistry,
    policy: SignatureVerificationPolicy,
) -> SamlResult<LoginReview> {
    let xml = bindings::decode_any(payload)?;
    policy.check(&xml)?;
    let summary = parser::parse_authn_request(&xml)?;
    let issuer = summary
        .issuer
        .ok_or_else(|| SamlError::MissingElement("Issuer".to_string()))?;
    let record = registry.lookup(&issuer)?;
    info!(issuer = %issuer, request_id = ?summary.request_id, "accepted login request");
    Ok(LoginReview {
        sp_entity_id: record.entity_id.clone(),
        acs_url: record.callback_url.clone(),
        in_response_to: summary.request_id,
    })
}

/// The IdP's answer to a reviewed login: a POST-bound response.
#[derive(Debug, Clone)]
pub struct LoginCompletion {
    /// ACS URL the form posts to.
    pub acs_url: String,

    /// Auto-submitting HTML form page carrying the `SAMLResponse`.
    pub form_html: String,
}

/// Completes a login for an authenticated user.
///
/// Builds the response and assertion, encodes them for the HTTP-POST
/// binding, and renders the auto-submit form addressed to the SP's ACS URL.
#[must_use]
pub fn complete_login(
    idp_entity_id: &str,
    review: &LoginReview,
    profile: &UserProfile,
    relay_state: Option<&str>,
    now: DateTime<Utc>,
) -> LoginCompletion {
    let params = ResponseParams {
        idp_entity_id: idp_entity_id.to_string(),
        sp_entity_id: review.sp_entity_id.clone(),
        acs_url: review.acs_url.clone(),
        in_response_to: review.in_response_to.clone(),
    };
    let (response, xml) = builder::build_response(&params, profile, now);
    let encoded = bindings::encode_post(&xml);
    let form_html = bindings::post::auto_submit_form(
        &review.acs_url,
        SamlMessageType::Response,
        &encoded,
        relay_state,
    );
    info!(
        response_id = %response.id,
        sp = %review.sp_entity_id,
        subject = %profile.email,
        "completed login"
    );
    LoginCompletion {
        acs_url: review.acs_url.clone(),
        form_html,
    }
}

/// Authenticated session extracted from a consumed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    /// Subject name ID.
    pub name_id: String,

    /// Subject attributes as delivered.
    pub attributes: Vec<(String, String)>,
}

impl LoginSession {
    /// Looks up an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Consumes an incoming `SAMLResponse` payload on the SP side.
///
/// Decodes the payload, checks the signature policy, and when the response
/// carries `InResponseTo`, consumes the matching outstanding request.
/// Responses correlated to an unknown or already-consumed request are
/// rejected; unsolicited responses (no `InResponseTo`) pass through.
pub fn consume_login_response(
    payload: &str,
    outstanding: &mut OutstandingRequests,
    policy: SignatureVerificationPolicy,
    now: DateTime<Utc>,
) -> SamlResult<LoginSession> {
    let xml = bindings::decode_any(payload)?;
    policy.check(&xml)?;
    let summary = parser::parse_response(&xml)?;
    if let Some(request_id) = &summary.in_response_to {
        if !outstanding.consume(request_id, now) {
            warn!(request_id = %request_id, "rejecting response to unknown or consumed request");
            return Err(SamlError::StaleResponse(request_id.clone()));
        }
    }
    let name_id = summary
        .name_id
        .clone()
        .or_else(|| summary.attribute("email").map(str::to_string))
        .ok_or_else(|| SamlError::MissingElement("NameID".to_string()))?;
    info!(name_id = %name_id, "consumed login response");
    Ok(LoginSession {
        name_id,
        attributes: summary.attributes,
    })
}

/// Request IDs awaiting a response, each consumable exactly once.
///
/// Entries expire after the assertion validity window; expired entries are
/// swept on every insert so the store stays bounded without a background
/// task.
#[derive(Debug, Default)]
pub struct OutstandingRequests {
    pending: HashMap<String, DateTime<Utc>>,
}

impl OutstandingRequests {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request issued at `now`.
    pub fn record(&mut self, request_id: impl Into<String>, now: DateTime<Utc>) {
        self.sweep(now);
        self.pending
            .insert(request_id.into(), now + Duration::minutes(ASSERTION_VALIDITY_MINUTES));
    }

    /// Consumes a request ID, returning whether it was outstanding.
    ///
    /// A consumed ID is removed, so a second response correlated to the
    /// same request is rejected.
    pub fn consume(&mut self, request_id: &str, now: DateTime<Utc>) -> bool {
        match self.pending.remove(request_id) {
            Some(expires_at) => now < expires_at,
            None => false,
        }
    }

    /// Number of unexpired outstanding requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no requests are outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn sweep(&mut self, now: DateTime<Utc>) {
        self.pending.retain(|_, expires_at| now < *expires_at);
    }
}
