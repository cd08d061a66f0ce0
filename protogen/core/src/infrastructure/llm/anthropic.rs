// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Anthropic LLM Provider Adapter
//
// Anti-Corruption Layer for the Anthropic Messages API

use crate::domain::llm::{FinishReason, GenerationOptions, GenerationResponse, LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_http_client, parse_json, status_error, transport_error};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    model: Option<String>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl AnthropicAdapter {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicAdapter {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError> {
        let request = AnthropicRequest {
            model: &self.model,
            system: system_prompt,
            messages: vec![AnthropicMessage {
                role: "user",
                content: user_prompt,
            }],
            max_tokens: options.max_output_tokens,
            temperature: options.temperature,
        };

        let url = format!("{}/messages", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response, &self.model).await);
        }

        let anthropic_response: AnthropicResponse = parse_json(response).await?;
        let stop_reason = anthropic_response.stop_reason.as_deref();

        let texts: Vec<String> = anthropic_response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if texts.is_empty() {
            return Err(match stop_reason {
                Some("refusal") => LlmError::Blocked("stop reason refusal".into()),
                _ => LlmError::EmptyResponse,
            });
        }

        Ok(GenerationResponse {
            text: texts.concat(),
            model: anthropic_response.model.unwrap_or_else(|| self.model.clone()),
            finish_reason: match stop_reason {
                None | Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
                Some("max_tokens") => FinishReason::Length,
                Some("refusal") => FinishReason::ContentFilter,
                Some(other) => FinishReason::Other(other.to_string()),
            },
        })
    }
}
