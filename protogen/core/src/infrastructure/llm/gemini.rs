// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gemini LLM Provider Adapter
//
// Anti-Corruption Layer for the Google Generative Language API.
// Gemini takes one combined prompt, and a candidate's text may arrive split
// across several parts.

use crate::domain::llm::{FinishReason, GenerationOptions, GenerationResponse, LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_http_client, parse_json, status_error, transport_error};

/// Finish reasons that mean the candidate was withheld by a filter.
const BLOCKING_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

pub struct GeminiAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

impl GeminiAdapter {
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

    /// Gemini takes a single prompt: system and user joined by a blank line.
    pub fn combine_prompts(system_prompt: &str, user_prompt: &str) -> String {
        format!("{}\n\n{}", system_prompt, user_prompt)
    }

    fn url(&self) -> String {
        let model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), model)
    }
}

#[async_trait]
impl LlmProvider for GeminiAdapter {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(Self::combine_prompts(system_prompt, user_prompt)),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response, &self.model).await);
        }

        let gemini_response: GeminiResponse = parse_json(response).await?;

        let Some(candidate) = gemini_response.candidates.into_iter().next() else {
            return Err(match gemini_response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => LlmError::Blocked(format!("prompt blocked ({})", reason)),
                None => LlmError::EmptyResponse,
            });
        };

        let finish_reason = candidate.finish_reason.as_deref();
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        if parts.iter().all(|p| p.text.is_none()) {
            return Err(match finish_reason {
                Some(reason) if BLOCKING_REASONS.contains(&reason) => {
                    LlmError::Blocked(format!("finish reason {}", reason))
                }
                _ => LlmError::EmptyResponse,
            });
        }

        // Join every fragment, not just the first.
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();

        Ok(GenerationResponse {
            text,
            model: gemini_response.model_version.unwrap_or_else(|| self.model.clone()),
            finish_reason: match finish_reason {
                None | Some("STOP") => FinishReason::Stop,
                Some("MAX_TOKENS") => FinishReason::Length,
                Some(reason) if BLOCKING_REASONS.contains(&reason) => FinishReason::ContentFilter,
                Some(other) => FinishReason::Other(other.to_string()),
            },
        })
    }
}
