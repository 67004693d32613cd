// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the papertrail research assistant.
//!
//! Only failures that stop something live here. A tool that fails is not an
//! error at this level: the model reads the failure text and carries on.
//! MCP transport errors live next to the client in [`crate::mcp::McpError`].

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure talking to the completion API.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing, revoked or rejected API key (HTTP 401).
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// HTTP 429.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The conversation, tool results included, no longer fits the model.
    #[error("Context window exceeded: {0}")]
    ContextWindowExceeded(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Response parsing error: {0}")]
    ParseError(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl ProviderError {
    pub fn api(message: impl Into<String>, status_code: u16) -> Self {
        Self::ApiError {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// API error for a failure that carried no HTTP status.
    pub fn api_message(message: impl Into<String>) -> Self {
        Self::ApiError {
            message: message.into(),
            status_code: None,
        }
    }

    /// Whether asking again later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::NetworkError(_) | Self::Timeout(_) => true,
            Self::ApiError {
                status_code: Some(code),
                ..
            } => *code >= 500,
            _ => false,
        }
    }
}

/// Failure loading application configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Cannot parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn read(path: &Path, err: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Errors that end a query before the conversation loop produces an answer.
///
/// Tool failures are not here: they are fed back to the model as tool
/// messages and never abort a turn.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Query cancelled")]
    Cancelled,
}

/// Result alias for the binary edge.
pub type Result<T> = anyhow::Result<T>;
