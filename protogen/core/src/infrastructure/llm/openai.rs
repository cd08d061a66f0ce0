// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI LLM Provider Adapter
//
// Anti-Corruption Layer for the OpenAI Chat Completions API.
// Also works with OpenAI-compatible APIs (LM Studio, vLLM, etc.)

use crate::domain::llm::{FinishReason, GenerationOptions, GenerationResponse, LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_http_client, parse_json, status_error, transport_error};

pub struct OpenAIAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl OpenAIAdapter {
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
impl LlmProvider for OpenAIAdapter {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError> {
        let request = OpenAIRequest {
            model: &self.model,
            messages: vec![
                OpenAIMessage {
                    role: "system",
                    content: system_prompt,
                },
                OpenAIMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: options.max_output_tokens,
            temperature: options.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response, &self.model).await);
        }

        let openai_response: OpenAIResponse = parse_json(response).await?;
        let model = openai_response.model.unwrap_or_else(|| self.model.clone());

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        if let Some(refusal) = choice.message.refusal {
            return Err(LlmError::Blocked(refusal));
        }

        let Some(text) = choice.message.content else {
            return Err(match choice.finish_reason.as_deref() {
                Some("content_filter") => LlmError::Blocked("finish reason content_filter".into()),
                _ => LlmError::EmptyResponse,
            });
        };

        Ok(GenerationResponse {
            text,
            model,
            finish_reason: match choice.finish_reason.as_deref() {
                None | Some("stop") => FinishReason::Stop,
                Some("length") => FinishReason::Length,
                Some("content_filter") => FinishReason::ContentFilter,
                Some(other) => FinishReason::Other(other.to_string()),
            },
        })
    }
}
