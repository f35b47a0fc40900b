//! Demo IdP and SP servers for the SAML Web Browser SSO exchange.
//!
//! One binary serves either role: the identity provider (login form,
//! response issuance, SP registry listing) or the service provider
//! (login initiation, assertion consumer callback, frontend hand-off).

#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod idp;
pub mod metadata;
pub mod sp;
pub mod state;
pub mod ui;

use anyhow::Result;

use crate::config::{IdpConfig, SpConfig};
use crate::state::{IdpState, SpState};

/// Builds the IdP router from environment configuration.
pub fn idp_app() -> Result<axum::Router> {
    let config = IdpConfig::from_env()?;
    let cert_body = config
        .cert_path
        .as_deref()
        .map(metadata::load_cert_body)
        .transpose()?;
    Ok(idp::router(IdpState::new(config, cert_body)))
}

/// Builds the SP router from environment configuration.
pub fn sp_app() -> Result<axum::Router> {
    let config = SpConfig::from_env()?;
    Ok(sp::router(SpState::new(config)))
}
