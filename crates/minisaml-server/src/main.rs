//! Server entry point.
//!
//! Runs as `minisaml idp` or `minisaml sp`; each role binds its own port
//! and serves until interrupted.

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use minisaml_server::config::{IdpConfig, SpConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let role = std::env::args().nth(1).unwrap_or_default();
    let (app, port) = match role.as_str() {
        "idp" => {
            let port = IdpConfig::from_env()?.port;
            (minisaml_server::idp_app()?, port)
        }
        "sp" => {
            let port = SpConfig::from_env()?.port;
            (minisaml_server::sp_app()?, port)
        }
        _ => bail!("usage: minisaml <idp|sp>"),
    };

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(role = %role, %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
