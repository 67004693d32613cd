// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Connection lifecycle and capability discovery for all configured servers.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::client::{McpClient, McpConnection};
use super::config::{McpConfig, ServerConfig};
use super::error::McpError;
use super::registry::CapabilityRegistry;
use super::types::ConnectionState;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

/// The three discovery calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Tools,
    Prompts,
    Resources,
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tools => write!(f, "tools"),
            Self::Prompts => write!(f, "prompts"),
            Self::Resources => write!(f, "resources"),
        }
    }
}

/// A discovery call that failed. The other calls still ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryIssue {
    pub kind: CapabilityKind,
    pub error: String,
}

impl std::fmt::Display for DiscoveryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error loading {}: {}", self.kind, self.error)
    }
}

/// What one server contributed to the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub server: String,
    pub tools: usize,
    pub prompts: usize,
    pub resources: usize,
    /// Tools hidden by `enabled_tools` / `disabled_tools`.
    pub filtered_tools: usize,
    pub issues: Vec<DiscoveryIssue>,
}

impl DiscoveryReport {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Owns every server connection and the registry built from them.
///
/// Connections are closed last-opened-first by [`shutdown`](Self::shutdown).
/// Child processes are also killed if the manager is dropped without it.
#[derive(Default)]
pub struct ConnectionManager {
    connections: Vec<(String, Arc<dyn McpConnection>)>,
    registry: CapabilityRegistry,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn one server, handshake and discover its capabilities.
    pub async fn connect(
        &mut self,
        server_name: &str,
        config: &ServerConfig,
    ) -> Result<DiscoveryReport, McpError> {
        let start = Instant::now();
        let client = McpClient::connect(server_name, config).await?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("mcp.connect", start.elapsed());

        let report = self
            .discover_filtered(server_name, Arc::new(client), Some(config))
            .await;

        info!(
            server = server_name,
            tools = report.tools,
            prompts = report.prompts,
            resources = report.resources,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Server ready"
        );
        Ok(report)
    }

    /// Connect every enabled server in configuration order.
    ///
    /// The first connection failure aborts startup: servers already opened
    /// are closed and the error, naming the failed server, is returned.
    pub async fn connect_all(&mut self, config: &McpConfig) -> Result<Vec<DiscoveryReport>, McpError> {
        let mut reports = Vec::new();

        for (name, server) in config.servers() {
            if !server.enabled {
                info!(server = name, "Skipping disabled server");
                continue;
            }

            match self.connect(name, server).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    self.shutdown().await;
                    return Err(e);
                }
            }
        }

        Ok(reports)
    }

    /// Take ownership of an open connection and register its capabilities.
    pub async fn discover(
        &mut self,
        server_name: &str,
        connection: Arc<dyn McpConnection>,
    ) -> DiscoveryReport {
        self.discover_filtered(server_name, connection, None).await
    }

    async fn discover_filtered(
        &mut self,
        server_name: &str,
        connection: Arc<dyn McpConnection>,
        config: Option<&ServerConfig>,
    ) -> DiscoveryReport {
        self.connections
            .push((server_name.to_string(), Arc::clone(&connection)));

        let mut report = DiscoveryReport {
            server: server_name.to_string(),
            ..Default::default()
        };

        // Each listing is independent: a failure is recorded and the next runs.
        match connection.list_tools().await {
            Ok(tools) => {
                for tool in tools {
                    if config.is_some_and(|c| !c.is_tool_enabled(&tool.name)) {
                        report.filtered_tools += 1;
                        continue;
                    }
                    self.registry
                        .register_tool(server_name, tool, Arc::clone(&connection));
                    report.tools += 1;
                }
            }
            Err(e) => report.issues.push(issue(server_name, CapabilityKind::Tools, e)),
        }

        match connection.list_prompts().await {
            Ok(prompts) => {
                report.prompts = prompts.len();
                for prompt in prompts {
                    self.registry
                        .register_prompt(server_name, prompt, Arc::clone(&connection));
                }
            }
            Err(e) => report.issues.push(issue(server_name, CapabilityKind::Prompts, e)),
        }

        match connection.list_resources().await {
            Ok(resources) => {
                report.resources = resources.len();
                for resource in resources {
                    self.registry
                        .register_resource(server_name, resource, Arc::clone(&connection));
                }
            }
            Err(e) => report.issues.push(issue(server_name, CapabilityKind::Resources, e)),
        }

        report
    }

    /// Close every connection, last opened first. Idempotent.
    pub async fn shutdown(&mut self) {
        while let Some((name, connection)) = self.connections.pop() {
            info!(server = %name, "Closing MCP server");
            connection.close().await;
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Frozen copy of the registry for sharing across sessions.
    pub fn snapshot(&self) -> Arc<CapabilityRegistry> {
        Arc::new(self.registry.clone())
    }

    /// Connected server names in connection order.
    pub fn servers(&self) -> Vec<&str> {
        self.connections.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Liveness of every connection.
    pub fn connection_states(&self) -> Vec<(String, ConnectionState)> {
        self.connections
            .iter()
            .map(|(name, c)| {
                let state = if c.is_alive() {
                    ConnectionState::Ready
                } else {
                    ConnectionState::Closed
                };
                (name.clone(), state)
            })
            .collect()
    }
}

fn issue(server: &str, kind: CapabilityKind, error: McpError) -> DiscoveryIssue {
    warn!(server, %kind, error = %error, "Discovery failed");
    DiscoveryIssue {
        kind,
        error: error.to_string(),
    }
}
