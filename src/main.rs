// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use auth0_envelope::{
    api::router,
    auth::Auth0Plugin,
    config::{self, LogFormat, DEFAULT_LOG_FILTER},
    error::ConfigError,
    state::AppState,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(LogFormat::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Gateway stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialise logging: {e}");
    }
}

async fn run() -> Result<(), StartupError> {
    let options = config::load_options()?;
    let addr = config::bind_addr()?;

    info!(
        domain = options.domain(),
        audience = options.audience(),
        jwks_uri = %options.jwks_uri(),
        prevent_unauthenticated = options.prevent_unauthenticated_access(),
        "Auth0 plugin configured"
    );

    let state = AppState::new(Auth0Plugin::new(options)?);

    // Warm the key cache; readiness reports failures.
    let warmup = state.plugin.clone();
    tokio::spawn(async move {
        if let Err(e) = warmup.jwks().get_signing_keys().await {
            warn!(error = %e, "Initial JWKS fetch failed");
        }
    });

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_ctrl_c(shutdown.clone()));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Auth0 gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Auth0 gateway shut down");
    Ok(())
}

async fn watch_ctrl_c(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
