// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Papertrail - a research assistant over MCP tool servers.
//!
//! An LLM answers questions about academic papers by calling tools that
//! independent MCP servers expose. This crate connects to those servers,
//! routes every tool, prompt and resource to its owner, and runs the bounded
//! conversation loop between the model and the tools.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Core type definitions (Message, ToolDefinition, ProviderResponse, etc.)
//! - [`error`] - Error types and result aliases
//! - [`config`] - Configuration loading and merging
//! - [`providers`] - LLM provider implementations (Groq, OpenAI, Ollama)
//! - [`mcp`] - MCP server connections, discovery and capability routing
//! - [`agent`] - The conversation orchestrator
//! - [`dispatch`] - Direct prompt and resource access
//! - [`commands`] - User input parsing
//! - [`chat`] - Sessions and the process-wide runtime
//! - [`telemetry`] - Tracing and metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use papertrail::agent::AgentConfig;
//! use papertrail::chat::Assistant;
//! use papertrail::mcp::McpConfig;
//! use papertrail::providers::create_provider_from_config;
//!
//! let config = papertrail::config::load_config(".".as_ref(), Default::default())?;
//! let servers = McpConfig::load_from_file(&config.server_config)?;
//! let provider = create_provider_from_config(&config)?;
//!
//! let mut assistant =
//!     Assistant::start(&servers, provider.into(), AgentConfig::from_resolved(&config)).await?;
//! let mut session = assistant.session();
//! if let Some(reply) = session.handle_input("@folders").await {
//!     println!("{}", reply.text());
//! }
//! assistant.shutdown().await;
//! ```

pub mod agent;
pub mod chat;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mcp;
pub mod providers;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use agent::{Agent, AgentCallbacks, AgentConfig, AgentOptions, TurnStats};
pub use chat::{Assistant, ChatSession, Reply};
pub use commands::{parse_command, Command};
pub use dispatch::Dispatcher;
pub use error::{AgentError, ConfigError, ProviderError, Result};
pub use mcp::{CapabilityRegistry, ConnectionManager, McpConfig, McpError, ServerConfig};
pub use providers::{create_provider, create_provider_from_config, OpenAIProvider, ProviderType};
pub use types::{
    // Message types
    Message, Role,
    // Tool types
    ToolCall, ToolDefinition,
    // Provider types
    BoxedProvider, Provider, ProviderConfig, ProviderResponse, SharedProvider, StopReason,
    TokenUsage,
};

/// Papertrail version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        let _msg = Message::user("test");
        let _response = ProviderResponse::empty();
        let _command = parse_command("/prompts");
    }
}
