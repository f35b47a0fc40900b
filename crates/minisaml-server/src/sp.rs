//! Service provider endpoints.
//!
//! `GET /login` starts the exchange with a redirect to the IdP,
//! `POST /callback` consumes the returned `SAMLResponse` and hands the
//! session to the frontend, and `GET /metadata` serves the SP descriptor.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use minisaml_protocol::{consume_login_response, initiate_login, SamlError};

use crate::state::SpState;
use crate::ui::SamlFailure;

/// Builds the SP router.
pub fn router(state: SpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metadata", get(metadata))
        .route("/login", get(login))
        .route("/callback", post(callback))
        .with_state(state)
}

async fn index(State(state): State<SpState>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<body>
<h1>Service Provider</h1>
<p>Entity ID: <code>{}</code></p>
<p><a href="/login">Sign in via SSO</a></p>
</body>
</html>"#,
        state.config().entity_id
    ))
}

async fn metadata(State(state): State<SpState>) -> Response {
    let xml = crate::metadata::sp_descriptor(
        &state.config().entity_id,
        &state.config().callback_url,
        None,
    );
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    #[serde(rename = "RelayState")]
    relay_state: Option<String>,
}

async fn login(
    State(state): State<SpState>,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect, SamlFailure> {
    let now = Utc::now();
    let config = state.config();
    let redirect = initiate_login(
        &config.entity_id,
        &config.idp_login_url,
        &config.callback_url,
        query.relay_state.as_deref(),
        now,
    )?;
    state.with_outstanding(|outstanding| outstanding.record(redirect.request.id.clone(), now));
    Ok(Redirect::to(&redirect.url))
}

#[derive(Debug, Deserialize)]
struct CallbackForm {
    #[serde(rename = "SAMLResponse")]
    saml_response: Option<String>,
    #[serde(rename = "RelayState")]
    relay_state: Option<String>,
}

async fn callback(
    State(state): State<SpState>,
    Form(form): Form<CallbackForm>,
) -> Result<Redirect, SamlFailure> {
    let payload = form
        .saml_response
        .ok_or_else(|| SamlError::InvalidRequest("missing SAMLResponse field".to_string()))?;
    let now = Utc::now();
    let result = state.with_outstanding(|outstanding| {
        consume_login_response(&payload, outstanding, state.policy(), now)
    });
    let frontend = &state.config().frontend_url;
    match result {
        Ok(session) => {
            let user = json!({
                "nameID": session.name_id,
                "email": session.attribute("email"),
                "firstName": session.attribute("firstName"),
                "lastName": session.attribute("lastName"),
                "displayName": session.attribute("displayName"),
                "role": session.attribute("role"),
            });
            info!(name_id = %session.name_id, relay_state = ?form.relay_state, "login complete");
            let url = format!(
                "{frontend}?user={}&authenticated=true&token=sample-jwt-token",
                urlencoding::encode(&user.to_string())
            );
            Ok(Redirect::to(&url))
        }
        Err(err) => {
            // Processing failures surface on the frontend, not as raw 4xx.
            warn!(error = %err, "callback processing failed");
            let url = format!(
                "{frontend}?error={}&authenticated=false",
                urlencoding::encode(&err.to_string())
            );
            Ok(Redirect::to(&url))
        }
    }
}
