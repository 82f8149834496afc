//! Configuration types for zonesync
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::endpoint::DEFAULT_SLASH_ESCAPE;

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a configuration for `provider` with default engine settings
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Hetzner Cloud DNS
    Hetzner {
        /// API token
        api_token: String,
        /// API base URL override
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Hetzner configuration against the public API
    pub fn hetzner(api_token: impl Into<String>) -> Self {
        ProviderConfig::Hetzner {
            api_token: api_token.into(),
            base_url: None,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Hetzner { api_token, base_url } => {
                if api_token.trim().is_empty() {
                    return Err(crate::Error::config("Hetzner API token cannot be empty"));
                }
                if base_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
                    return Err(crate::Error::config("Hetzner API URL cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Hetzner { .. } => "hetzner",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Hetzner { base_url, .. } => f
                .debug_struct("Hetzner")
                .field("api_token", &"<REDACTED>")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Apply changes through zone-file export/import instead of per-record calls
    #[serde(default)]
    pub bulk_mode: bool,

    /// Log changes instead of applying them
    #[serde(default)]
    pub dry_run: bool,

    /// Token standing in for `/` in transported label keys
    #[serde(default = "default_slash_escape")]
    pub slash_escape: String,

    /// TTL assumed for zones the provider reports without one
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.slash_escape.is_empty() {
            return Err(crate::Error::config("Slash escape token cannot be empty"));
        }
        if self.slash_escape.contains([';', '=']) {
            return Err(crate::Error::config(format!(
                "Slash escape token '{}' must not contain ';' or '='",
                self.slash_escape
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bulk_mode: false,
            dry_run: false,
            slash_escape: default_slash_escape(),
            default_ttl: default_ttl(),
        }
    }
}

fn default_slash_escape() -> String {
    DEFAULT_SLASH_ESCAPE.to_string()
}

fn default_ttl() -> u32 {
    3600
}
