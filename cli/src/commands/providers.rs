// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provider availability listing
//!
//! Reports which providers the dispatcher would construct from the current
//! configuration. No request is sent to any vendor.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use protogen_core::domain::llm::ProviderId;

use super::{build_service, load_config};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let service = build_service(&config)?;
    let dispatcher = service.dispatcher();

    println!("{}", "LLM providers (fallback order):".bold());
    for id in ProviderId::PRIORITY {
        let model = config.spec.providers.get(id).model_for(id);
        if dispatcher.is_available(id) {
            println!("  {} {:<10} {}", "✓".green(), id.as_str(), model.dimmed());
        } else {
            println!(
                "  {} {:<10} {}",
                "✗".red(),
                id.as_str(),
                format!("set {}", id.credential_env_var()).dimmed()
            );
        }
    }

    match dispatcher.select_provider(ProviderId::default()) {
        Ok(selected) => println!(
            "\nRequests for '{}' are served by {}",
            ProviderId::default(),
            selected.display_name().bold()
        ),
        Err(e) => println!("\n{}", e.to_string().yellow()),
    }

    Ok(())
}
