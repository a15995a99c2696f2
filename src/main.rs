// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use session_relay::{
    api::router,
    auth::{IdentityResolver, TrustedHeaderPolicy},
    config::ApiConfig,
    server,
    state::AppState,
    telemetry,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(?config, "Starting people API");

    let codec = config.relay.codec();
    let store = config.relay.connect_store().await;
    let resolver = IdentityResolver::new(codec, store)
        .with_trusted_header(TrustedHeaderPolicy::from_peers(config.trusted_proxies.clone()));

    let app = router(AppState::new(resolver));

    let listener = match TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, bind = %config.bind, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!("People API listening on http://{} (docs at /docs)", config.bind);

    let shutdown = CancellationToken::new();
    server::cancel_on_signal(shutdown.clone());

    if let Err(e) = server::serve(listener, app, shutdown).await {
        error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
