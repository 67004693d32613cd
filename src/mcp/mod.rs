// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Model Context Protocol (MCP) client side.
//!
//! Papertrail reaches its paper search and retrieval tools through one or
//! more MCP servers, each a child process speaking JSON-RPC over stdio.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                   ConnectionManager                    │
//! │  ┌────────────┐  ┌────────────┐   ┌────────────────┐   │
//! │  │ McpClient  │  │ McpClient  │   │ Capability     │   │
//! │  │ (research) │  │ (fetch)    │──▶│ Registry       │   │
//! │  └─────┬──────┘  └─────┬──────┘   │ name → server  │   │
//! └────────┼───────────────┼──────────┴────────────────┴───┘
//!          │ stdio         │ stdio
//!    ┌─────▼─────┐   ┌─────▼─────┐
//!    │  server   │   │  server   │
//!    │  process  │   │  process  │
//!    └───────────┘   └───────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use papertrail::mcp::{ConnectionManager, McpConfig};
//!
//! let config = McpConfig::load_from_file("server_config.json")?;
//! let mut manager = ConnectionManager::new();
//! manager.connect_all(&config).await?;
//!
//! let registry = manager.snapshot();
//! if let Some(route) = registry.lookup("search_papers") {
//!     let result = route.connection.call_tool("search_papers", args).await?;
//! }
//!
//! manager.shutdown().await;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod types;

pub use client::{McpClient, McpConnection};
pub use config::{McpConfig, ServerConfig};
pub use error::McpError;
pub use manager::{CapabilityKind, ConnectionManager, DiscoveryIssue, DiscoveryReport};
pub use registry::{CapabilityRegistry, Route};
pub use types::*;
