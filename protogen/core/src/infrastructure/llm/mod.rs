// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain `LlmProvider` interface and one
// vendor's HTTP API. The dispatcher owns the table of constructed adapters.

pub mod anthropic;
pub mod dispatcher;
pub mod gemini;
pub mod openai;

pub use dispatcher::ProviderDispatcher;

use crate::domain::llm::LlmError;
use std::time::Duration;

/// Build the HTTP client an adapter holds for the process lifetime.
pub(crate) fn build_http_client(timeout: Option<Duration>) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

pub(crate) fn transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(err.to_string())
    } else {
        LlmError::Network(err.to_string())
    }
}

/// Map a non-2xx response to an error, keeping the raw body for diagnosis.
pub(crate) async fn status_error(response: reqwest::Response, model: &str) -> LlmError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 | 403 => LlmError::Authentication(error_text),
        404 => LlmError::ModelNotFound(model.to_string()),
        408 | 504 => LlmError::Timeout(format!("HTTP {}: {}", status, error_text)),
        429 => LlmError::RateLimit(error_text),
        code => LlmError::Http {
            status: code,
            body: error_text,
        },
    }
}

pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, LlmError> {
    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body)
        .map_err(|e| LlmError::MalformedResponse(format!("Failed to parse response: {}", e)))
}
