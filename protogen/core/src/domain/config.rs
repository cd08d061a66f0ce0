// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for the Proto-Gen service:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Per-provider credentials, endpoints and models
// - HTTP server binding and CORS origins
//
// Credentials are read once at startup; nothing here is reloaded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::llm::{ProviderCredentials, ProviderId};

pub const API_VERSION: &str = "protogen/v1";
pub const KIND: &str = "ServiceConfig";

/// Top-level Kubernetes-style service configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfigManifest {
    /// API version (must be "protogen/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServiceConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: ServiceConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable deployment name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfigSpec {
    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: ProviderConfig,

    #[serde(default)]
    pub openai: ProviderConfig,

    #[serde(default)]
    pub anthropic: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, provider: ProviderId) -> &ProviderConfig {
        match provider {
            ProviderId::Gemini => &self.gemini,
            ProviderId::OpenAi => &self.openai,
            ProviderId::Anthropic => &self.anthropic,
        }
    }

    pub fn get_mut(&mut self, provider: ProviderId) -> &mut ProviderConfig {
        match provider {
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::OpenAi => &mut self.openai,
            ProviderId::Anthropic => &mut self.anthropic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API base URL; the vendor's public endpoint when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Model identifier; the vendor default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Whether this provider may be used at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// HTTP client timeout in seconds (reqwest default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            model: None,
            enabled: true,
            request_timeout_secs: None,
        }
    }
}

impl ProviderConfig {
    pub fn endpoint_for(&self, provider: ProviderId) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| provider.default_endpoint().to_string())
    }

    pub fn model_for(&self, provider: ProviderId) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

impl Default for ServiceConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "proto-gen".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: ServiceConfigSpec::default(),
        }
    }
}

impl ServiceConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. PROTOGEN_CONFIG_PATH environment variable
    /// 2. ./protogen-config.yaml (working directory)
    /// 3. ~/.protogen/config.yaml (user home)
    /// 4. /etc/protogen/config.yaml (system, Unix) or C:\ProgramData\ProtoGen\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PROTOGEN_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./protogen-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".protogen").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/protogen/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\ProtoGen\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::info!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for provider in ProviderId::PRIORITY {
            let var = provider.credential_env_var();
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                tracing::debug!("Environment override: {} is set", var);
                self.spec.providers.get_mut(provider).api_key = Some(key);
            }
        }

        if let Some(val) = lookup("PROTOGEN_PORT") {
            match val.trim().parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: PROTOGEN_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for PROTOGEN_PORT: '{}'. Expected a port number. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(val) = lookup("PROTOGEN_CORS_ORIGINS") {
            let origins: Vec<String> = val
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
            tracing::info!("Environment override: PROTOGEN_CORS_ORIGINS ({} origins)", origins.len());
            self.spec.server.cors_origins = origins;
        }
    }

    /// Resolve every enabled provider's API key.
    ///
    /// `env:VAR_NAME` keys are read from the environment; an unset variable
    /// leaves that provider without a credential rather than failing startup.
    pub fn credentials(&self) -> ProviderCredentials {
        ProviderCredentials::from_entries(ProviderId::PRIORITY.into_iter().map(|provider| {
            let config = self.spec.providers.get(provider);
            let key = if config.enabled {
                resolve_api_key(provider, config.api_key.as_deref())
            } else {
                None
            };
            (provider, key)
        }))
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        for provider in ProviderId::PRIORITY {
            let config = self.spec.providers.get(provider);
            if !config.enabled {
                continue;
            }
            if config.endpoint.as_deref().is_some_and(|e| e.trim().is_empty()) {
                anyhow::bail!("Endpoint cannot be empty for provider: {}", provider);
            }
            if config.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
                anyhow::bail!("Model identifier cannot be empty for provider: {}", provider);
            }
            if config.request_timeout_secs == Some(0) {
                anyhow::bail!("request_timeout_secs must be positive for provider: {}", provider);
            }
        }

        if self.spec.server.port == 0 {
            anyhow::bail!("spec.server.port cannot be 0");
        }

        Ok(())
    }
}

fn resolve_api_key(provider: ProviderId, key: Option<&str>) -> Option<String> {
    match key {
        Some(k) if k.starts_with("env:") => {
            let var_name = &k["env:".len()..];
            match std::env::var(var_name) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(
                        "Environment variable {} referenced by {} api_key is not set",
                        var_name,
                        provider
                    );
                    None
                }
            }
        }
        Some(k) => Some(k.to_string()),
        None => None,
    }
}
