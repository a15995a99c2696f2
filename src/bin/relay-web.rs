// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use session_relay::{
    auth::SessionIssuer,
    config::WebConfig,
    server, telemetry,
    web::{router, BackendClient, WebState},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let config = match WebConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(?config, "Starting web tier");

    if config.api_url.is_none() {
        warn!("API_URL is not set; pages will report the API as unconfigured");
    }

    let store = config.relay.connect_store().await;
    let issuer = config
        .relay
        .codec()
        .map(|codec| SessionIssuer::new(codec, store, config.session_ttl));

    let backend = match BackendClient::new(config.api_url.clone()) {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "Failed to build API client");
            return ExitCode::FAILURE;
        }
    };

    let app = router(WebState::new(issuer, backend, config.cookie_secure));

    let listener = match TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, bind = %config.bind, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!("Web tier listening on http://{}", config.bind);

    let shutdown = CancellationToken::new();
    server::cancel_on_signal(shutdown.clone());

    if let Err(e) = server::serve(listener, app, shutdown).await {
        error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
