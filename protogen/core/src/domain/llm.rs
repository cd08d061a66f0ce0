// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! LLM Provider Domain Interface
//!
//! Isolates the protocol service from vendor APIs. Each backend implements
//! [`LlmProvider`]; the dispatcher picks one by [`ProviderId`].
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Provider identities, generation request/result types and
//!   the error taxonomy for vendor calls and dispatch

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Known LLM backends.
///
/// Declaration order is the fallback priority order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    OpenAi,
    Anthropic,
}

impl ProviderId {
    /// Fixed fallback priority order.
    pub const PRIORITY: [ProviderId; 3] = [ProviderId::Gemini, ProviderId::OpenAi, ProviderId::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    /// Environment variable that carries this provider's API key.
    pub fn credential_env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "models/gemini-2.5-flash",
            Self::OpenAi => "gpt-4-turbo-preview",
            Self::Anthropic => "claude-3-sonnet-20240229",
        }
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::Gemini
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown LLM provider '{0}'. Expected one of: gemini, openai, anthropic")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// API keys per provider, resolved once at startup.
///
/// Blank secrets are dropped on construction, so `get` only ever returns a
/// usable key.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    keys: BTreeMap<ProviderId, String>,
}

impl ProviderCredentials {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ProviderId, Option<S>)>,
        S: Into<String>,
    {
        let keys = entries
            .into_iter()
            .filter_map(|(id, key)| {
                let key: String = key?.into();
                let key = key.trim().to_string();
                (!key.is_empty()).then_some((id, key))
            })
            .collect();
        Self { keys }
    }

    pub fn get(&self, provider: ProviderId) -> Option<&str> {
        self.keys.get(&provider).map(String::as_str)
    }

    pub fn has(&self, provider: ProviderId) -> bool {
        self.keys.contains_key(&provider)
    }
}

// Keys never reach logs.
impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys.keys()).finish()
    }
}

/// Sampling parameters passed through to the backend unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: 4000,
        }
    }
}

/// One generation call as built by the route layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub requested_provider: ProviderId,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        requested_provider: ProviderId,
    ) -> Self {
        let defaults = GenerationOptions::default();
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            requested_provider,
            temperature: defaults.temperature,
            max_output_tokens: defaults.max_output_tokens,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// Generated text and the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub provider_used: ProviderId,
}

/// Normalized vendor response returned by an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    /// Full generated text, all fragments joined in order
    pub text: String,

    /// Model identifier the vendor reported or that was requested
    pub model: String,

    pub finish_reason: FinishReason,
}

impl GenerationResponse {
    /// Length of `text` in Unicode scalar values, not bytes.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Reason why generation stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural completion (model decided to stop)
    Stop,

    /// Hit max_output_tokens
    Length,

    /// Cut short by a content filter after emitting some text
    ContentFilter,

    /// Vendor-specific reason we do not map
    Other(String),
}

impl FinishReason {
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Errors raised by a single vendor call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Response blocked: {0}")]
    Blocked(String),
}

impl LlmError {
    /// Error kind without any vendor-supplied text, safe to show to clients.
    pub fn summary(&self) -> String {
        match self {
            Self::Network(_) => "Network error".to_string(),
            Self::Timeout(_) => "Request timed out".to_string(),
            Self::Authentication(_) => "Authentication failed".to_string(),
            Self::RateLimit(_) => "Rate limit exceeded".to_string(),
            Self::ModelNotFound(model) => format!("Model not found: {}", model),
            Self::Http { status, .. } => format!("Provider error (HTTP {})", status),
            Self::MalformedResponse(_) => "Malformed response".to_string(),
            Self::EmptyResponse => "Response contained no text".to_string(),
            Self::Blocked(_) => "Response blocked".to_string(),
        }
    }
}

/// Capability implemented once per vendor.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a system/user prompt pair.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LlmError>;
}

/// Errors surfaced by the dispatcher to the route layer.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(
        "{} is not configured. Set {} or add an api_key for it in the configuration file.",
        .provider.display_name(),
        .provider.credential_env_var()
    )]
    ProviderNotConfigured { provider: ProviderId },

    #[error("{} API error: {source}", .provider.display_name())]
    VendorCallFailed {
        provider: ProviderId,
        #[source]
        source: LlmError,
    },

    #[error(
        "No LLM providers are available. Please configure GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY in the environment or .env file."
    )]
    NoProviderAvailable,
}

impl DispatchError {
    /// Provider named by the error, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::ProviderNotConfigured { provider } | Self::VendorCallFailed { provider, .. } => {
                Some(*provider)
            }
            Self::NoProviderAvailable => None,
        }
    }

    /// Message for API clients. Vendor call failures keep only the vendor
    /// name and error kind; raw response bodies stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::VendorCallFailed { provider, source } => {
                format!("{} API error: {}", provider.display_name(), source.summary())
            }
            other => other.to_string(),
        }
    }

    /// True for errors an operator fixes in configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotConfigured { .. } | Self::NoProviderAvailable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_count_is_not_byte_length() {
        let response = GenerationResponse {
            text: "Incubate 5 µL at 37 °C".to_string(),
            model: "m".to_string(),
            finish_reason: FinishReason::Stop,
        };
        assert_eq!(response.char_count(), 22);
        assert_eq!(response.text.len(), 24);
    }

    #[test]
    fn test_priority_matches_ordering() {
        let mut ids = vec![ProviderId::Anthropic, ProviderId::Gemini, ProviderId::OpenAi];
        ids.sort();
        assert_eq!(ids, ProviderId::PRIORITY.to_vec());
    }

    #[test]
    fn test_provider_id_parsing() {
        assert_eq!("gemini".parse::<ProviderId>().unwrap(), ProviderId::Gemini);
        assert_eq!(" OpenAI ".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert_eq!("anthropic".parse::<ProviderId>().unwrap(), ProviderId::Anthropic);
        assert!("ollama".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_provider_id_serde_names() {
        let json = serde_json::to_string(&ProviderId::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let parsed: ProviderId = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(parsed, ProviderId::Anthropic);
    }

    #[test]
    fn test_credentials_drop_blank_keys() {
        let creds = ProviderCredentials::from_entries([
            (ProviderId::Gemini, Some("  ")),
            (ProviderId::OpenAi, Some("sk-test")),
            (ProviderId::Anthropic, None),
        ]);
        assert!(!creds.has(ProviderId::Gemini));
        assert_eq!(creds.get(ProviderId::OpenAi), Some("sk-test"));
        assert!(!creds.has(ProviderId::Anthropic));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = ProviderCredentials::from_entries([(ProviderId::OpenAi, Some("sk-secret"))]);
        let debug = format!("{:?}", creds);
        assert!(debug.contains("OpenAi"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_dispatch_error_messages() {
        let err = DispatchError::VendorCallFailed {
            provider: ProviderId::Gemini,
            source: LlmError::Timeout("deadline elapsed".into()),
        };
        assert_eq!(err.to_string(), "Gemini API error: Request timed out: deadline elapsed");
        assert_eq!(err.provider(), Some(ProviderId::Gemini));
        assert!(!err.is_configuration_error());

        let err = DispatchError::ProviderNotConfigured { provider: ProviderId::Anthropic };
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert!(err.is_configuration_error());

        assert!(DispatchError::NoProviderAvailable.to_string().contains("configure"));
    }

    #[test]
    fn test_user_message_drops_vendor_body() {
        let err = DispatchError::VendorCallFailed {
            provider: ProviderId::OpenAi,
            source: LlmError::Http {
                status: 500,
                body: r#"{"error":{"request_id":"req_abc"}}"#.into(),
            },
        };
        assert!(err.to_string().contains("req_abc"));
        assert_eq!(err.user_message(), "OpenAI API error: Provider error (HTTP 500)");

        let err = DispatchError::VendorCallFailed {
            provider: ProviderId::Anthropic,
            source: LlmError::Authentication("invalid x-api-key sk-ant-123".into()),
        };
        assert_eq!(err.user_message(), "Anthropic API error: Authentication failed");

        let err = DispatchError::NoProviderAvailable;
        assert_eq!(err.user_message(), err.to_string());
    }
}
