// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use protogen_core::presentation::api;

use super::{build_service, load_config};

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (overrides spec.server.bind_address)
    #[arg(long, env = "PROTOGEN_HOST")]
    pub host: Option<String>,

    /// HTTP API port (overrides spec.server.port)
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(host) = args.host {
        config.spec.server.bind_address = host;
    }
    if let Some(port) = args.port {
        config.spec.server.port = port;
    }

    info!("Proto-Gen starting: {}", config.metadata.name);

    let service = build_service(&config)?;

    let available = service.dispatcher().available_providers();
    if available.is_empty() {
        warn!(
            "No LLM providers available. Set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY."
        );
    } else {
        let names: Vec<&str> = available.iter().map(|id| id.as_str()).collect();
        info!("Available providers: {}", names.join(", "));
    }

    let app = api::app(service, &config.spec.server.cors_origins);

    let addr = format!(
        "{}:{}",
        config.spec.server.bind_address, config.spec.server.port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Proto-Gen shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
