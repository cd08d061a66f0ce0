// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use protogen_core::domain::config::ServiceConfigManifest;
use protogen_core::domain::llm::ProviderId;

pub const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
pub const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./protogen-config.yaml)
        #[arg(short, long, default_value = "./protogen-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ServiceConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. PROTOGEN_CONFIG_PATH: {}",
            std::env::var("PROTOGEN_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./protogen-config.yaml");
        println!("  4. ~/.protogen/config.yaml");
        println!("  5. /etc/protogen/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    let credentials = config.credentials();

    println!("{}", "LLM Providers (fallback order):".bold());
    for id in ProviderId::PRIORITY {
        let provider = config.spec.providers.get(id);
        let state = if !provider.enabled {
            "disabled".dimmed()
        } else if credentials.has(id) {
            "configured".green()
        } else {
            format!("no credential ({})", id.credential_env_var()).yellow()
        };
        println!("  {} [{}]", id.display_name().bold(), state);
        println!("    Endpoint: {}", provider.endpoint_for(id));
        println!("    Model: {}", provider.model_for(id));
        if let Some(timeout) = provider.request_timeout_secs {
            println!("    Timeout: {}s", timeout);
        }
    }
    println!();

    println!("{}", "Server:".bold());
    println!(
        "  Listen: {}:{}",
        config.spec.server.bind_address, config.spec.server.port
    );
    println!("  CORS origins: {}", config.spec.server.cors_origins.join(", "));
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServiceConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    let credentials = config.credentials();
    if !ProviderId::PRIORITY.iter().any(|id| credentials.has(*id)) {
        println!(
            "{}",
            "! No provider has a credential; generation requests will fail".yellow()
        );
    }

    Ok(())
}

async fn generate(output: &Path, with_examples: bool) -> Result<()> {
    write_template(output, with_examples)?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

pub fn write_template(output: &Path, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))
}
