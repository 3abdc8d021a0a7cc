// Copyright 2025-Present vnet-telemetry contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vnet_telemetry::{
    buffer_service::BufferService,
    config::TelemetryConfig,
    errors::StartError,
    server::{ServerState, TelemetryServer},
};

#[tokio::main]
pub async fn main() {
    let config = match TelemetryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cancel_token = CancellationToken::new();
    let mut state = ServerState::default();

    let (service, handle) = match BufferService::new(&config, cancel_token.clone()) {
        Ok(pair) => pair,
        Err(e) => {
            error!("failed to initialize buffer service: {e}");
            std::process::exit(1);
        }
    };

    match TelemetryServer::bind(&config.socket_path, handle, cancel_token.clone()) {
        Ok(server) => {
            info!(
                "telemetry endpoint bound at {}, buffering reports",
                config.socket_path.display()
            );
            let server_task = tokio::spawn(server.spin());
            let service_task = tokio::spawn(service.run());

            wait_for_shutdown(&cancel_token).await;

            if let Err(e) = tokio::try_join!(server_task, service_task) {
                error!("task join failed during shutdown: {e}");
            }
        }
        Err(StartError::AlreadyRunning) => {
            // A peer instance owns buffering; this process only waits for
            // the shutdown signal.
            state.endpoint_already_bound = true;
            info!("telemetry endpoint already owned by a peer instance, idling until shutdown");
            wait_for_shutdown(&cancel_token).await;
        }
        Err(e) => {
            error!("failed to start telemetry server: {e}");
            std::process::exit(1);
        }
    }

    info!(
        endpoint_already_bound = state.endpoint_already_bound,
        "telemetry agent stopped"
    );
}

async fn wait_for_shutdown(cancel_token: &CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
    cancel_token.cancel();
}
