// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! LLM provider implementations.
//!
//! Every supported backend speaks the OpenAI Chat Completions API, so one
//! [`openai::OpenAIProvider`] serves them all:
//!
//! - **Groq** (default) - hosted Llama models, key in `GROQ_API_KEY`
//! - **OpenAI** - key in `OPENAI_API_KEY`
//! - **Ollama** - local models, no key
//! - **OpenAI-compatible** - any other endpoint, `base_url` required
//!
//! # Quick Start
//!
//! ```bash
//! export GROQ_API_KEY=your-key
//! ```
//!
//! ```rust,ignore
//! use papertrail::providers::create_provider_from_config;
//!
//! let provider = create_provider_from_config(&resolved)?;
//! let response = provider.chat(&messages, Some(&tools), None).await?;
//! ```

pub mod openai;

pub use openai::OpenAIProvider;

use crate::config::ResolvedConfig;
use crate::error::ProviderError;
use crate::types::{BoxedProvider, ProviderConfig};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default completion length.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Supported provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderType {
    /// Groq hosted models
    #[default]
    Groq,
    /// OpenAI GPT models
    OpenAI,
    /// Ollama local models
    Ollama,
    /// Any OpenAI-compatible API
    OpenAICompatible,
}

impl ProviderType {
    /// Get the default model for this provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Groq => "llama-3.3-70b-versatile",
            Self::OpenAI => "gpt-4o-mini",
            Self::Ollama => "llama3.2",
            Self::OpenAICompatible => "gpt-4o-mini",
        }
    }

    /// Get the default base URL for this provider.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some(openai::GROQ_BASE_URL),
            Self::OpenAI => Some(openai::OPENAI_BASE_URL),
            Self::Ollama => Some(openai::OLLAMA_BASE_URL),
            Self::OpenAICompatible => None,
        }
    }

    /// Environment variable holding the API key, if this provider uses one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("GROQ_API_KEY"),
            Self::OpenAI | Self::OpenAICompatible => Some("OPENAI_API_KEY"),
            Self::Ollama => None,
        }
    }

    /// Check if this provider requires an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Groq | Self::OpenAI)
    }
}

/// Error type for parsing a provider type from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProviderTypeError;

impl std::fmt::Display for ParseProviderTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid provider type")
    }
}

impl std::error::Error for ParseProviderTypeError {}

impl std::str::FromStr for ProviderType {
    type Err = ParseProviderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" | "gpt" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "openai-compatible" | "openai_compatible" => Ok(Self::OpenAICompatible),
            _ => Err(ParseProviderTypeError),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Groq => write!(f, "Groq"),
            Self::OpenAI => write!(f, "OpenAI"),
            Self::Ollama => write!(f, "Ollama"),
            Self::OpenAICompatible => write!(f, "OpenAI-Compatible"),
        }
    }
}

/// Create a provider instance from type and configuration.
///
/// # Errors
///
/// Returns [`ProviderError::NotConfigured`] if a required API key or base
/// URL is missing.
///
/// # Example
///
/// ```rust,ignore
/// let config = ProviderConfig::new("your-key", "llama-3.3-70b-versatile");
/// let provider = create_provider(ProviderType::Groq, config)?;
/// ```
pub fn create_provider(
    provider_type: ProviderType,
    config: ProviderConfig,
) -> Result<BoxedProvider, ProviderError> {
    let api_key = config.api_key.clone();
    if provider_type.requires_api_key() && api_key.is_none() {
        let hint = provider_type.api_key_env().unwrap_or("an API key");
        return Err(ProviderError::NotConfigured(format!(
            "API key required for {}. Set {}.",
            provider_type, hint
        )));
    }

    let model = config
        .model
        .clone()
        .unwrap_or_else(|| provider_type.default_model().to_string());

    let base_url = config
        .base_url
        .clone()
        .or_else(|| provider_type.default_base_url().map(str::to_string))
        .ok_or_else(|| {
            ProviderError::NotConfigured("base_url required for OpenAI-Compatible".to_string())
        })?;

    Ok(Box::new(OpenAIProvider::new(api_key, model, base_url, config)?))
}

/// Create a provider from a resolved configuration.
///
/// The API key comes from the provider's environment variable. Temperature
/// and max tokens fall back to 0.7 and 4096.
pub fn create_provider_from_config(config: &ResolvedConfig) -> Result<BoxedProvider, ProviderError> {
    let provider_type: ProviderType = config.provider.parse().map_err(|_| {
        ProviderError::NotConfigured(format!("Unknown provider: {}", config.provider))
    })?;

    let provider_config = ProviderConfig {
        api_key: provider_type
            .api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty()),
        base_url: config.base_url.clone(),
        model: config.model.clone(),
        temperature: Some(config.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
        max_tokens: Some(config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
        timeout_ms: Some(config.llm_timeout_secs.saturating_mul(1000)),
    };

    create_provider(provider_type, provider_config)
}
