// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Provider Dispatcher - Provider Selection and Fallback
//
// Holds one constructed adapter per configured provider and routes each
// generation call to exactly one of them. When the requested provider is
// unavailable the first available provider in priority order is substituted
// up front. A failed vendor call is never retried or rerouted.

use crate::domain::config::{ProviderConfig, ProvidersConfig};
use crate::domain::llm::{
    DispatchError, GenerationRequest, GenerationResult, LlmProvider, ProviderCredentials,
    ProviderId,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::anthropic::AnthropicAdapter;
use super::gemini::GeminiAdapter;
use super::openai::OpenAIAdapter;

/// Lookup table of usable providers, built once at startup and read-only after.
pub struct ProviderDispatcher {
    // Keyed by ProviderId so iteration follows priority order.
    providers: BTreeMap<ProviderId, Arc<dyn LlmProvider>>,
}

impl ProviderDispatcher {
    /// Build adapters for every provider that has a credential.
    ///
    /// A provider whose adapter fails to construct is logged and left out;
    /// startup continues with the rest.
    pub fn from_config(config: &ProvidersConfig, credentials: &ProviderCredentials) -> Self {
        let mut providers = BTreeMap::new();

        info!("Initializing LLM provider dispatcher");

        for id in ProviderId::PRIORITY {
            let provider_config = config.get(id);

            if !provider_config.enabled {
                info!("Provider '{}' disabled, skipping", id);
                continue;
            }

            let Some(api_key) = credentials.get(id) else {
                info!(
                    "Provider '{}' has no credential ({} unset), skipping",
                    id,
                    id.credential_env_var()
                );
                continue;
            };

            match Self::create_provider(id, provider_config, api_key) {
                Ok(provider) => {
                    info!(
                        "Initialized provider: {} ({})",
                        id,
                        provider_config.model_for(id)
                    );
                    providers.insert(id, provider);
                }
                Err(e) => {
                    warn!("Failed to initialize provider '{}': {}", id, e);
                }
            }
        }

        if providers.is_empty() {
            warn!("No LLM providers configured - generation requests will fail");
        }

        Self { providers }
    }

    /// Build a dispatcher over already-constructed providers.
    pub fn from_providers<I>(providers: I) -> Self
    where
        I: IntoIterator<Item = (ProviderId, Arc<dyn LlmProvider>)>,
    {
        Self {
            providers: providers.into_iter().collect(),
        }
    }

    fn create_provider(
        id: ProviderId,
        config: &ProviderConfig,
        api_key: &str,
    ) -> anyhow::Result<Arc<dyn LlmProvider>> {
        let endpoint = config.endpoint_for(id);
        let model = config.model_for(id);
        let api_key = api_key.to_string();
        let timeout = config.request_timeout_secs.map(Duration::from_secs);

        let provider: Arc<dyn LlmProvider> = match id {
            ProviderId::Gemini => Arc::new(GeminiAdapter::new(endpoint, api_key, model, timeout)?),
            ProviderId::OpenAi => Arc::new(OpenAIAdapter::new(endpoint, api_key, model, timeout)?),
            ProviderId::Anthropic => {
                Arc::new(AnthropicAdapter::new(endpoint, api_key, model, timeout)?)
            }
        };

        Ok(provider)
    }

    /// Whether `provider` can serve calls. No network round trip.
    pub fn is_available(&self, provider: ProviderId) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Available providers in priority order.
    pub fn available_providers(&self) -> Vec<ProviderId> {
        self.providers.keys().copied().collect()
    }

    /// Pick the provider that will serve a request for `requested`.
    pub fn select_provider(&self, requested: ProviderId) -> Result<ProviderId, DispatchError> {
        if self.is_available(requested) {
            return Ok(requested);
        }

        let fallback = self
            .providers
            .keys()
            .next()
            .copied()
            .ok_or(DispatchError::NoProviderAvailable)?;

        warn!(
            "Requested provider '{}' is not available, falling back to '{}'",
            requested, fallback
        );
        Ok(fallback)
    }

    /// Generate text, substituting a configured provider if the requested one
    /// is unavailable.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, DispatchError> {
        let provider = self.select_provider(request.requested_provider)?;
        self.call(provider, request).await
    }

    /// Generate text with exactly `provider`, without fallback.
    ///
    /// Fails with `ProviderNotConfigured` when `provider` is unavailable.
    pub async fn dispatch_to(
        &self,
        provider: ProviderId,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, DispatchError> {
        if !self.is_available(provider) {
            return Err(DispatchError::ProviderNotConfigured { provider });
        }
        self.call(provider, request).await
    }

    async fn call(
        &self,
        provider: ProviderId,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, DispatchError> {
        let backend = self
            .providers
            .get(&provider)
            .ok_or(DispatchError::ProviderNotConfigured { provider })?;

        debug!(
            "Dispatching to {} (temperature={}, max_output_tokens={})",
            provider, request.temperature, request.max_output_tokens
        );

        let response = backend
            .generate(&request.system_prompt, &request.user_prompt, &request.options())
            .await
            .map_err(|source| {
                error!("{} generation failed: {}", provider.display_name(), source);
                DispatchError::VendorCallFailed { provider, source }
            })?;

        if !response.finish_reason.is_normal() {
            warn!(
                "{} response from model '{}' ended with {:?}; returning partial text",
                provider.display_name(),
                response.model,
                response.finish_reason
            );
        }

        info!(
            "Generation succeeded with {} ({} chars)",
            provider,
            response.char_count()
        );

        Ok(GenerationResult {
            text: response.text,
            provider_used: provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{FinishReason, GenerationOptions, GenerationResponse, LlmError};
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl LlmProvider for Fixed {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<GenerationResponse, LlmError> {
            Ok(GenerationResponse {
                text: self.0.to_string(),
                model: "fixed".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn dispatcher(ids: &[ProviderId]) -> ProviderDispatcher {
        ProviderDispatcher::from_providers(
            ids.iter()
                .map(|id| (*id, Arc::new(Fixed(id.as_str())) as Arc<dyn LlmProvider>)),
        )
    }

    #[test]
    fn test_select_requested_when_available() {
        let d = dispatcher(&[ProviderId::Gemini, ProviderId::Anthropic]);
        assert_eq!(d.select_provider(ProviderId::Anthropic).unwrap(), ProviderId::Anthropic);
    }

    #[test]
    fn test_select_falls_back_in_priority_order() {
        let d = dispatcher(&[ProviderId::Anthropic, ProviderId::OpenAi]);
        assert_eq!(d.select_provider(ProviderId::Gemini).unwrap(), ProviderId::OpenAi);
        assert_eq!(d.available_providers(), vec![ProviderId::OpenAi, ProviderId::Anthropic]);
    }

    #[test]
    fn test_select_with_nothing_configured() {
        let d = dispatcher(&[]);
        assert!(matches!(
            d.select_provider(ProviderId::Gemini),
            Err(DispatchError::NoProviderAvailable)
        ));
    }

    #[test]
    fn test_from_config_skips_providers_without_credentials() {
        let config = ProvidersConfig::default();
        let credentials = ProviderCredentials::from_entries([
            (ProviderId::OpenAi, Some("sk-test")),
            (ProviderId::Gemini, None),
        ]);

        let d = ProviderDispatcher::from_config(&config, &credentials);
        assert_eq!(d.available_providers(), vec![ProviderId::OpenAi]);
    }

    #[test]
    fn test_from_config_skips_disabled_providers() {
        let mut config = ProvidersConfig::default();
        config.get_mut(ProviderId::Gemini).enabled = false;
        let credentials = ProviderCredentials::from_entries([
            (ProviderId::Gemini, Some("g-key")),
            (ProviderId::Anthropic, Some("a-key")),
        ]);

        let d = ProviderDispatcher::from_config(&config, &credentials);
        assert!(!d.is_available(ProviderId::Gemini));
        assert!(d.is_available(ProviderId::Anthropic));
    }

    #[tokio::test]
    async fn test_dispatch_to_does_not_fall_back() {
        let d = dispatcher(&[ProviderId::Gemini]);
        let request = GenerationRequest::new("sys", "user", ProviderId::OpenAi);

        let err = d.dispatch_to(ProviderId::OpenAi, &request).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::ProviderNotConfigured { provider: ProviderId::OpenAi }
        ));

        let result = d.generate(&request).await.unwrap();
        assert_eq!(result.provider_used, ProviderId::Gemini);
        assert_eq!(result.text, "gemini");
    }
}
