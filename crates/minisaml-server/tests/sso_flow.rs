//! End-to-end exchange tests driving the IdP and SP routers in-process.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use minisaml_protocol::SpRegistry;
use minisaml_server::config::{IdpConfig, SpConfig};
use minisaml_server::state::{IdpState, SpState};
use minisaml_server::{idp, sp};

const IDP_ENTITY_ID: &str = "http://localhost:7000/metadata";
const IDP_LOGIN_URL: &str = "http://localhost:7000/login";
const SP_ENTITY_ID: &str = "http://localhost:4000";
const SP_CALLBACK_URL: &str = "http://localhost:4000/callback";
const FRONTEND_URL: &str = "http://localhost:3000";

fn idp_router() -> Router {
    let config = IdpConfig {
        port: 7000,
        entity_id: IDP_ENTITY_ID.to_string(),
        login_url: IDP_LOGIN_URL.to_string(),
        registry: SpRegistry::from_json(&format!(
            r#"[{{"entityId": "{SP_ENTITY_ID}", "callbackUrl": "{SP_CALLBACK_URL}"}}]"#
        ))
        .unwrap(),
        cert_path: None,
    };
    idp::router(IdpState::new(config, None))
}

fn sp_state() -> SpState {
    SpState::new(SpConfig {
        port: 4000,
        entity_id: SP_ENTITY_ID.to_string(),
        callback_url: SP_CALLBACK_URL.to_string(),
        idp_login_url: IDP_LOGIN_URL.to_string(),
        frontend_url: FRONTEND_URL.to_string(),
    })
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_body(fields: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in fields {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

fn form_request(uri: &str, body: String) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn extract_form_value(html: &str, field: &str) -> String {
    let marker = format!(r#"name="{field}" value=""#);
    let start = html.find(&marker).unwrap() + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = url::Url::parse(url).unwrap();
    parsed
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Runs SP login then IdP authentication, returning the SP state, the
/// encoded `SAMLResponse`, and the relay state echoed by the IdP form.
async fn authenticate_through_idp(relay_state: &str) -> (SpState, Router, String) {
    let state = sp_state();
    let sp_router = sp::router(state.clone());

    let response = sp_router
        .clone()
        .oneshot(
            Request::get(format!("/login?RelayState={relay_state}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with(IDP_LOGIN_URL));
    let saml_request = query_param(&location, "SAMLRequest").unwrap();

    let response = idp_router()
        .oneshot(form_request(
            "/login",
            form_body(&[
                ("SAMLRequest", &saml_request),
                ("RelayState", relay_state),
                ("email", "user@example.com"),
                ("password", "password123"),
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains(&format!(r#"action="{SP_CALLBACK_URL}""#)));
    let saml_response = extract_form_value(&html, "SAMLResponse");
    (state, sp_router, saml_response)
}

#[tokio::test]
async fn idp_metadata_describes_sso_endpoints() {
    let response = idp_router()
        .oneshot(Request::get("/metadata").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let xml = body_string(response).await;
    assert!(xml.contains(&format!(r#"entityID="{IDP_ENTITY_ID}""#)));
    assert!(xml.contains("IDPSSODescriptor"));
}

#[tokio::test]
async fn sp_metadata_describes_acs() {
    let response = sp::router(sp_state())
        .oneshot(Request::get("/metadata").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_string(response).await;
    assert!(xml.contains("SPSSODescriptor"));
    assert!(xml.contains(&format!(r#"Location="{SP_CALLBACK_URL}""#)));
}

#[tokio::test]
async fn sp_login_redirects_to_idp_with_request_and_relay_state() {
    let response = sp::router(sp_state())
        .oneshot(
            Request::get("/login?RelayState=%2Fdashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let saml_request = query_param(&location, "SAMLRequest").unwrap();
    let xml = minisaml_protocol::decode_any(&saml_request).unwrap();
    assert!(xml.contains(&format!("<saml:Issuer>{SP_ENTITY_ID}</saml:Issuer>")));
    assert_eq!(query_param(&location, "RelayState").as_deref(), Some("/dashboard"));
}

#[tokio::test]
async fn idp_login_form_carries_request_through() {
    let state = sp_state();
    let response = sp::router(state)
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let query = url::Url::parse(&location).unwrap().query().unwrap().to_string();

    let response = idp_router()
        .oneshot(
            Request::get(format!("/login?{query}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains(r#"name="SAMLRequest""#));
    assert!(html.contains(r#"name="password""#));
}

#[tokio::test]
async fn idp_login_without_request_is_bad_request() {
    let response = idp_router()
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn idp_rejects_unknown_issuer() {
    let xml = r#"<samlp:AuthnRequest ID="_x" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"><saml:Issuer>https://unknown.example</saml:Issuer></samlp:AuthnRequest>"#;
    let response = idp_router()
        .oneshot(form_request(
            "/login",
            form_body(&[
                ("SAMLRequest", xml),
                ("email", "user@example.com"),
                ("password", "password123"),
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_string(response).await;
    assert!(html.contains("unknown.example"));
}

#[tokio::test]
async fn idp_rejects_bad_credentials() {
    let response = sp::router(sp_state())
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let saml_request = query_param(&location, "SAMLRequest").unwrap();

    let response = idp_router()
        .oneshot(form_request(
            "/login",
            form_body(&[
                ("SAMLRequest", &saml_request),
                ("email", "user@example.com"),
                ("password", "wrong"),
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let html = body_string(response).await;
    // The form is re-shown with an error banner.
    assert!(html.contains(r#"name="SAMLRequest""#));
    assert!(html.contains("authentication failed"));
}

#[tokio::test]
async fn idp_lists_registered_sps() {
    let response = idp_router()
        .oneshot(Request::get("/sps").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    let records: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(records[0]["entityId"], SP_ENTITY_ID);
    assert_eq!(records[0]["callbackUrl"], SP_CALLBACK_URL);
}

#[tokio::test]
async fn full_exchange_hands_user_to_frontend() {
    let (_, sp_router, saml_response) = authenticate_through_idp("%2Fhome").await;

    let response = sp_router
        .oneshot(form_request(
            "/callback",
            form_body(&[("SAMLResponse", &saml_response), ("RelayState", "/home")]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with(FRONTEND_URL));
    assert_eq!(query_param(&location, "authenticated").as_deref(), Some("true"));
    assert_eq!(query_param(&location, "token").as_deref(), Some("sample-jwt-token"));

    let user: serde_json::Value =
        serde_json::from_str(&query_param(&location, "user").unwrap()).unwrap();
    assert_eq!(user["nameID"], "user@example.com");
    assert_eq!(user["displayName"], "Test User");
    assert_eq!(user["role"], "user");
}

#[tokio::test]
async fn replayed_response_is_rejected() {
    let (_, sp_router, saml_response) = authenticate_through_idp("x").await;

    let first = sp_router
        .clone()
        .oneshot(form_request(
            "/callback",
            form_body(&[("SAMLResponse", &saml_response)]),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    let location = first
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(query_param(&location, "authenticated").as_deref(), Some("true"));

    let second = sp_router
        .oneshot(form_request(
            "/callback",
            form_body(&[("SAMLResponse", &saml_response)]),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::SEE_OTHER);
    let location = second
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(query_param(&location, "authenticated").as_deref(), Some("false"));
    assert!(query_param(&location, "error").is_some());
}

#[tokio::test]
async fn callback_without_response_is_bad_request() {
    let response = sp::router(sp_state())
        .oneshot(form_request("/callback", form_body(&[("RelayState", "x")])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
