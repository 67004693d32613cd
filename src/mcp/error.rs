// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP error types.

use thiserror::Error;

/// Errors that can occur during MCP operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Spawning the server or completing the handshake failed.
    #[error("Error connecting to {server}: {message}")]
    ConnectionFailed { server: String, message: String },

    /// A request did not get a response in time.
    #[error("Request '{method}' to MCP server '{server}' timed out after {timeout_secs}s")]
    Timeout {
        server: String,
        method: String,
        timeout_secs: u64,
    },

    /// The server process exited or its stdout closed.
    #[error("Connection to MCP server '{0}' is closed")]
    ConnectionClosed(String),

    /// The server reported a tool failure (`isError: true`).
    #[error("Tool call '{tool}' failed: {message}")]
    ToolCallFailed { tool: String, message: String },

    /// JSON-RPC error object returned by the server.
    #[error("Protocol error: code={code}, message={message}")]
    Protocol { code: i64, message: String },

    /// Response that does not match the expected result shape.
    #[error("Invalid response from MCP server: {0}")]
    InvalidResponse(String),

    /// Server list file is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Create a connection failed error.
    pub fn connection_failed(server: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ConnectionFailed {
            server: server.into(),
            message: message.to_string(),
        }
    }

    /// Create a tool call failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolCallFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Whether the connection that produced this error can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionClosed(_) | Self::Io(_))
    }
}
