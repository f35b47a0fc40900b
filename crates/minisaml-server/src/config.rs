//! Server configuration.
//!
//! All configuration comes from the environment (with `.env` support via
//! dotenvy) and is read once at startup into immutable structs. Defaults
//! match the standard demo layout: IdP on 7000, SP on 4000, frontend on
//! 3000.

use anyhow::{Context, Result};

use minisaml_protocol::{ServiceProviderRecord, SpRegistry};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_port(name: &str, default: u16) -> Result<u16> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} is not a valid port: {value}")),
        Err(_) => Ok(default),
    }
}

/// Identity provider configuration.
#[derive(Debug, Clone)]
pub struct IdpConfig {
    /// Port the IdP listens on.
    pub port: u16,

    /// IdP entity ID, also its metadata URL.
    pub entity_id: String,

    /// Single sign-on endpoint URL.
    pub login_url: String,

    /// Registered service providers.
    pub registry: SpRegistry,

    /// Optional path to the IdP signing certificate (PEM), embedded in
    /// metadata when present.
    pub cert_path: Option<String>,
}

impl IdpConfig {
    /// Loads IdP configuration from the environment.
    ///
    /// `SERVICE_PROVIDERS` is a JSON list of registrations; when unset a
    /// single default SP on port 4000 is registered.
    pub fn from_env() -> Result<Self> {
        let port = env_port("IDP_PORT", 7000)?;
        let base_url = env_or("IDP_BASE_URL", &format!("http://localhost:{port}"));
        let registry = match std::env::var("SERVICE_PROVIDERS") {
            Ok(json) => SpRegistry::from_json(&json)
                .context("SERVICE_PROVIDERS is not a valid JSON list")?,
            Err(_) => SpRegistry::from_records(vec![ServiceProviderRecord::new(
                env_or("SP_ENTITY_ID", "http://localhost:4000"),
                env_or("SP_CALLBACK_URL", "http://localhost:4000/callback"),
            )]),
        };
        Ok(Self {
            port,
            entity_id: env_or("IDP_ENTITY_ID", &format!("{base_url}/metadata")),
            login_url: env_or("IDP_LOGIN_URL", &format!("{base_url}/login")),
            registry,
            cert_path: std::env::var("IDP_CERT_PATH").ok(),
        })
    }
}

/// Service provider configuration.
#[derive(Debug, Clone)]
pub struct SpConfig {
    /// Port the SP listens on.
    pub port: u16,

    /// SP entity ID, the issuer of its authentication requests.
    pub entity_id: String,

    /// Assertion consumer service URL responses are posted to.
    pub callback_url: String,

    /// IdP single sign-on endpoint to send authentication requests to.
    pub idp_login_url: String,

    /// Frontend application the callback redirects to.
    pub frontend_url: String,
}

impl SpConfig {
    /// Loads SP configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let port = env_port("SP_PORT", 4000)?;
        let base_url = env_or("SP_BASE_URL", &format!("http://localhost:{port}"));
        Ok(Self {
            port,
            entity_id: env_or("SP_ENTITY_ID", &base_url),
            callback_url: env_or("SP_CALLBACK_URL", &format!("{base_url}/callback")),
            idp_login_url: env_or("IDP_LOGIN_URL", "http://localhost:7000/login"),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:3000"),
        })
    }
}
