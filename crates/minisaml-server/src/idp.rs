//! Identity provider endpoints.
//!
//! `GET /metadata` serves the entity descriptor, `GET /login` shows the
//! login form for an incoming `SAMLRequest`, `POST /login` checks the
//! credentials and answers with the POST-bound response form, and
//! `GET /sps` lists the registered service providers.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use minisaml_protocol::{complete_login, review_login_request, SamlError, ServiceProviderRecord};

use crate::auth;
use crate::state::IdpState;
use crate::ui::{self, SamlFailure};

/// Builds the IdP router.
pub fn router(state: IdpState) -> Router {
    Router::new()
        .route("/metadata", get(metadata))
        .route("/login", get(show_login).post(handle_login))
        .route("/sps", get(list_sps))
        .with_state(state)
}

async fn metadata(State(state): State<IdpState>) -> Response {
    let xml = crate::metadata::idp_descriptor(
        &state.config().entity_id,
        &state.config().login_url,
        state.cert_body(),
    );
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    #[serde(rename = "SAMLRequest")]
    saml_request: Option<String>,
    #[serde(rename = "RelayState")]
    relay_state: Option<String>,
}

async fn show_login(
    State(state): State<IdpState>,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, SamlFailure> {
    let payload = query
        .saml_request
        .ok_or_else(|| SamlError::InvalidRequest("missing SAMLRequest parameter".to_string()))?;
    // Reject undeliverable requests before showing the form.
    review_login_request(&payload, &state.config().registry, state.policy())?;
    Ok(Html(ui::login_page(
        &payload,
        query.relay_state.as_deref(),
        None,
    )))
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(rename = "SAMLRequest")]
    saml_request: Option<String>,
    #[serde(rename = "RelayState")]
    relay_state: Option<String>,
    email: String,
    password: String,
}

async fn handle_login(
    State(state): State<IdpState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, SamlFailure> {
    let payload = form
        .saml_request
        .ok_or_else(|| SamlError::InvalidRequest("missing SAMLRequest field".to_string()))?;
    let review = review_login_request(&payload, &state.config().registry, state.policy())?;

    let profile = match auth::authenticate(&form.email, &form.password) {
        Ok(profile) => profile,
        Err(err) => {
            // Re-show the form so the user can retry.
            let page = ui::login_page(&payload, form.relay_state.as_deref(), Some(&err.to_string()));
            return Ok((StatusCode::UNAUTHORIZED, Html(page)).into_response());
        }
    };

    info!(email = %profile.email, sp = %review.sp_entity_id, "user authenticated");
    let completion = complete_login(
        &state.config().entity_id,
        &review,
        &profile,
        form.relay_state.as_deref(),
        Utc::now(),
    );
    Ok(Html(completion.form_html).into_response())
}

async fn list_sps(State(state): State<IdpState>) -> Json<Vec<ServiceProviderRecord>> {
    Json(state.config().registry.iter().cloned().collect())
}
