// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-off generation without running the server
//!
//! Reads a request payload (the same JSON the HTTP API accepts) and prints
//! the generated Markdown.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use protogen_core::application::ProtocolService;
use protogen_core::domain::llm::ProviderId;
use protogen_core::domain::protocol::{
    ProtocolGenerationRequest, RouteGenRequest, ToolGenRequest, TroubleshootingRequest,
};

use super::{build_service_with_fallback, load_config};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GenerationKind {
    /// Laboratory protocol
    Protocol,
    /// Troubleshooting analysis for a failed experiment
    Troubleshoot,
    /// Experimental route planning
    Routes,
    /// Computational tool recommendations
    Tools,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// What to generate
    #[arg(value_enum)]
    pub kind: GenerationKind,

    /// JSON request payload ("-" reads stdin)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Provider to request (overrides llm_provider in the payload)
    #[arg(short, long)]
    pub provider: Option<ProviderId>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Fail instead of falling back when the requested provider is unavailable
    #[arg(long)]
    pub strict: bool,
}

pub async fn execute(args: GenerateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let service = build_service_with_fallback(&config, !args.strict)?;

    let payload = read_payload(&args.input)?;
    let (text, provider_used) = run(&service, args.kind, &payload, args.provider).await?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write output to {:?}", path))?;
            eprintln!(
                "{}",
                format!("✓ Written to {} (provider: {})", path.display(), provider_used).green()
            );
        }
        None => {
            println!("{}", text);
            eprintln!("{}", format!("provider: {}", provider_used).dimmed());
        }
    }

    Ok(())
}

fn read_payload(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read stdin");
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {:?}", input))
}

fn parse<T: DeserializeOwned>(payload: &str, kind: GenerationKind) -> Result<T> {
    serde_json::from_str(payload).with_context(|| format!("Invalid {:?} request payload", kind))
}

/// Run one generation and return `(text, provider_used)`.
pub async fn run(
    service: &ProtocolService,
    kind: GenerationKind,
    payload: &str,
    provider: Option<ProviderId>,
) -> Result<(String, String)> {
    let result = match kind {
        GenerationKind::Protocol => {
            let mut request: ProtocolGenerationRequest = parse(payload, kind)?;
            if let Some(provider) = provider {
                request.llm_provider = provider;
            }
            let response = service.generate_protocol(&request).await?;
            (response.protocol, response.provider_used)
        }
        GenerationKind::Troubleshoot => {
            let mut request: TroubleshootingRequest = parse(payload, kind)?;
            if let Some(provider) = provider {
                request.llm_provider = provider;
            }
            let response = service.troubleshoot_protocol(&request).await?;
            (response.protocol, response.provider_used)
        }
        GenerationKind::Routes => {
            let mut request: RouteGenRequest = parse(payload, kind)?;
            if let Some(provider) = provider {
                request.llm_provider = provider;
            }
            let response = service.generate_routes(&request).await?;
            (response.routes, response.provider_used)
        }
        GenerationKind::Tools => {
            let mut request: ToolGenRequest = parse(payload, kind)?;
            if let Some(provider) = provider {
                request.llm_provider = provider;
            }
            let response = service.generate_tools(&request).await?;
            (response.recommendations, response.provider_used)
        }
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use protogen_core::domain::llm::{
        FinishReason, GenerationOptions, GenerationResponse, LlmError, LlmProvider,
    };
    use protogen_core::infrastructure::llm::ProviderDispatcher;
    use std::sync::Arc;

    struct Canned;

    #[async_trait]
    impl LlmProvider for Canned {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<GenerationResponse, LlmError> {
            Ok(GenerationResponse {
                text: "# Protocol".to_string(),
                model: "canned".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn service() -> ProtocolService {
        let dispatcher = ProviderDispatcher::from_providers([(
            ProviderId::Anthropic,
            Arc::new(Canned) as Arc<dyn LlmProvider>,
        )]);
        ProtocolService::new(Arc::new(dispatcher)).unwrap()
    }

    const PROTOCOL_PAYLOAD: &str = r#"{
        "experimental_goal": "Amplify a gene for cloning",
        "technique": "PCR",
        "reagents": "Q5 Polymerase",
        "template_details": "Plasmid DNA, 1 ng/uL",
        "llm_provider": "gemini"
    }"#;

    #[tokio::test]
    async fn test_run_protocol_with_provider_override() {
        let (text, provider) = run(
            &service(),
            GenerationKind::Protocol,
            PROTOCOL_PAYLOAD,
            Some(ProviderId::Anthropic),
        )
        .await
        .unwrap();

        assert_eq!(text, "# Protocol");
        assert_eq!(provider, "anthropic");
    }

    #[tokio::test]
    async fn test_strict_run_does_not_substitute_provider() {
        let strict = service().with_fallback(false);

        let err = run(&strict, GenerationKind::Protocol, PROTOCOL_PAYLOAD, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let (_, provider) = run(&service(), GenerationKind::Protocol, PROTOCOL_PAYLOAD, None)
            .await
            .unwrap();
        assert_eq!(provider, "anthropic");
    }

    #[test]
    fn test_strict_flag_parses() {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            args: GenerateArgs,
        }

        let harness =
            Harness::try_parse_from(["protogen", "protocol", "request.json", "--strict"]).unwrap();
        assert!(harness.args.strict);
        assert_eq!(harness.args.kind, GenerationKind::Protocol);
    }

    #[tokio::test]
    async fn test_run_rejects_wrong_payload_shape() {
        let payload = r#"{"user_goal": "Design primers for cloning"}"#;
        let err = run(&service(), GenerationKind::Routes, payload, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Routes"));
    }
}
