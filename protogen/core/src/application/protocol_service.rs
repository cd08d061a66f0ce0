// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Protocol Service
//!
//! Validates protocol requests, renders their prompts and hands the result to
//! the [`ProviderDispatcher`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Use cases behind the generate, troubleshoot, routes and
//!   tools endpoints

use std::sync::Arc;
use tracing::info;

use crate::domain::llm::{DispatchError, GenerationRequest, GenerationResult, ProviderId};
use crate::domain::protocol::{
    ProtocolGenerationRequest, ProtocolResponse, RouteGenRequest, RouteGenResponse,
    ToolGenRequest, ToolGenResponse, TroubleshootingRequest, ValidationError,
};
use crate::infrastructure::llm::ProviderDispatcher;
use crate::infrastructure::prompts::{PromptLibrary, PromptPair};

const MAX_OUTPUT_TOKENS: u32 = 8000;

const PROTOCOL_TEMPERATURE: f32 = 0.3;
const TROUBLESHOOTING_TEMPERATURE: f32 = 0.4;
const ROUTE_TEMPERATURE: f32 = 0.4;
const TOOL_TEMPERATURE: f32 = 0.3;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Failed to build prompt: {0}")]
    Prompt(String),
}

pub struct ProtocolService {
    dispatcher: Arc<ProviderDispatcher>,
    prompts: PromptLibrary,
    fallback: bool,
}

impl ProtocolService {
    pub fn new(dispatcher: Arc<ProviderDispatcher>) -> anyhow::Result<Self> {
        Ok(Self {
            dispatcher,
            prompts: PromptLibrary::new()?,
            fallback: true,
        })
    }

    /// Disable substitution of an unavailable provider. Requests for a
    /// provider that is not configured then fail with `ProviderNotConfigured`.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn dispatcher(&self) -> &ProviderDispatcher {
        &self.dispatcher
    }

    pub async fn generate_protocol(
        &self,
        request: &ProtocolGenerationRequest,
    ) -> Result<ProtocolResponse, ProtocolError> {
        request.validate()?;
        info!("Generating {} protocol", request.technique);

        let prompts = self.prompts.protocol(request).map_err(prompt_error)?;
        let result = self
            .run(prompts, request.llm_provider, PROTOCOL_TEMPERATURE)
            .await?;

        Ok(ProtocolResponse {
            success: true,
            protocol: result.text,
            provider_used: result.provider_used.to_string(),
            error: None,
        })
    }

    pub async fn troubleshoot_protocol(
        &self,
        request: &TroubleshootingRequest,
    ) -> Result<ProtocolResponse, ProtocolError> {
        request.validate()?;
        info!("Troubleshooting protocol");

        let prompts = self.prompts.troubleshooting(request).map_err(prompt_error)?;
        let result = self
            .run(prompts, request.llm_provider, TROUBLESHOOTING_TEMPERATURE)
            .await?;

        Ok(ProtocolResponse {
            success: true,
            protocol: result.text,
            provider_used: result.provider_used.to_string(),
            error: None,
        })
    }

    pub async fn generate_routes(
        &self,
        request: &RouteGenRequest,
    ) -> Result<RouteGenResponse, ProtocolError> {
        request.validate()?;
        info!("Planning experimental routes for {}", request.target_organism);

        let prompts = self.prompts.routes(request).map_err(prompt_error)?;
        let result = self
            .run(prompts, request.llm_provider, ROUTE_TEMPERATURE)
            .await?;

        Ok(RouteGenResponse {
            success: true,
            routes: result.text,
            provider_used: result.provider_used.to_string(),
            error: None,
        })
    }

    pub async fn generate_tools(
        &self,
        request: &ToolGenRequest,
    ) -> Result<ToolGenResponse, ProtocolError> {
        request.validate()?;
        info!("Recommending tools for {}", request.technique);

        let prompts = self.prompts.tools(request).map_err(prompt_error)?;
        let result = self
            .run(prompts, request.llm_provider, TOOL_TEMPERATURE)
            .await?;

        Ok(ToolGenResponse {
            success: true,
            recommendations: result.text,
            provider_used: result.provider_used.to_string(),
            error: None,
        })
    }

    async fn run(
        &self,
        prompts: PromptPair,
        provider: ProviderId,
        temperature: f32,
    ) -> Result<GenerationResult, ProtocolError> {
        let request = GenerationRequest::new(prompts.system, prompts.user, provider)
            .with_temperature(temperature)
            .with_max_output_tokens(MAX_OUTPUT_TOKENS);

        let result = if self.fallback {
            self.dispatcher.generate(&request).await?
        } else {
            self.dispatcher.dispatch_to(provider, &request).await?
        };

        Ok(result)
    }
}

fn prompt_error(err: anyhow::Error) -> ProtocolError {
    ProtocolError::Prompt(format!("{:#}", err))
}
