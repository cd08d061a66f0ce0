// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Proto-Gen CLI

pub mod config;
pub mod generate;
pub mod providers;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::generate::{GenerateArgs, GenerationKind};
pub use self::serve::ServeArgs;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use protogen_core::application::ProtocolService;
use protogen_core::domain::config::ServiceConfigManifest;
use protogen_core::infrastructure::llm::ProviderDispatcher;

/// Load, validate and return the service configuration.
pub fn load_config(config_path: Option<PathBuf>) -> Result<ServiceConfigManifest> {
    let config = ServiceConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Construct the dispatcher and protocol service once for the process.
pub fn build_service(config: &ServiceConfigManifest) -> Result<Arc<ProtocolService>> {
    build_service_with_fallback(config, true)
}

/// As [`build_service`], choosing whether unavailable providers are substituted.
pub fn build_service_with_fallback(
    config: &ServiceConfigManifest,
    fallback: bool,
) -> Result<Arc<ProtocolService>> {
    let dispatcher = Arc::new(ProviderDispatcher::from_config(
        &config.spec.providers,
        &config.credentials(),
    ));

    let service = ProtocolService::new(dispatcher)
        .context("Failed to load prompt templates")?
        .with_fallback(fallback);

    Ok(Arc::new(service))
}
