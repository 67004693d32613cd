// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! [`WorkspaceConfig`] is what a config file may contain; every field is
//! optional. [`ResolvedConfig`] is the merged result with defaults filled in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default server list file, relative to the working directory.
pub const DEFAULT_SERVER_CONFIG: &str = "server_config.json";

/// Default bound on LLM round trips per query.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Default per-completion timeout in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Application configuration as read from a file.
///
/// Can be defined in `papertrail.json`, `.papertrail.json` or
/// `papertrail.yaml` in the working directory, or globally in
/// `~/.papertrail/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Provider to use (groq, openai, ollama, openai-compatible)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model name to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Custom base URL for the completion API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens per completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum LLM round trips per query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,

    /// Timeout for a single completion, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_timeout_secs: Option<u64>,

    /// Path of the MCP server list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_config: Option<PathBuf>,

    /// System prompt sent ahead of every conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_iterations: usize,
    pub llm_timeout_secs: u64,
    pub server_config: PathBuf,
    pub system_prompt: Option<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: None,
            base_url: None,
            temperature: None,
            max_tokens: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            server_config: PathBuf::from(DEFAULT_SERVER_CONFIG),
            system_prompt: None,
        }
    }
}

impl ResolvedConfig {
    /// Reject values no provider or loop can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxIterations".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::InvalidValue {
                    field: "temperature".to_string(),
                    message: format!("{} is outside 0.0..=2.0", t),
                });
            }
        }
        if self.max_tokens == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "maxTokens".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.llm_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llmTimeoutSecs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
