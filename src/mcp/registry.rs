// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Capability routing.
//!
//! Maps every discovered tool name, prompt name and resource URI to the
//! connection that serves it. Tools, prompts and resources share one routing
//! table, so a prompt named like a tool takes over that name's route.
//! Registration is last-write-wins and entries are never purged; a route to
//! a dead connection stays and fails when used.

use std::collections::HashMap;
use std::sync::Arc;

use super::client::McpConnection;
use super::types::{McpPromptInfo, McpResourceInfo, McpToolInfo};
use crate::types::ToolDefinition;

/// Where a capability lives.
#[derive(Clone)]
pub struct Route {
    /// Configured name of the owning server.
    pub server: String,
    pub connection: Arc<dyn McpConnection>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("server", &self.server)
            .field("alive", &self.connection.is_alive())
            .finish()
    }
}

/// Routing table plus the catalogs shown to the model and the user.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    routes: HashMap<String, Route>,
    tools: Vec<McpToolInfo>,
    prompts: Vec<McpPromptInfo>,
    resources: Vec<McpResourceInfo>,
}

/// Insert or replace by key, keeping first-seen position.
fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T) -> bool) {
    match items.iter_mut().find(|existing| same(existing)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&mut self, key: String, server: &str, connection: Arc<dyn McpConnection>) {
        if let Some(previous) = self.routes.get(&key) {
            if previous.server != server {
                tracing::debug!(
                    name = %key,
                    from = %previous.server,
                    to = server,
                    "Capability re-registered by another server"
                );
            }
        }
        self.routes.insert(
            key,
            Route {
                server: server.to_string(),
                connection,
            },
        );
    }

    /// Register a tool served by `connection`.
    pub fn register_tool(
        &mut self,
        server: &str,
        tool: McpToolInfo,
        connection: Arc<dyn McpConnection>,
    ) {
        self.route(tool.name.clone(), server, connection);
        let name = tool.name.clone();
        upsert(&mut self.tools, tool, |t| t.name == name);
    }

    /// Register a prompt template served by `connection`.
    pub fn register_prompt(
        &mut self,
        server: &str,
        prompt: McpPromptInfo,
        connection: Arc<dyn McpConnection>,
    ) {
        self.route(prompt.name.clone(), server, connection);
        let name = prompt.name.clone();
        upsert(&mut self.prompts, prompt, |p| p.name == name);
    }

    /// Register a resource served by `connection`, keyed by its URI string.
    pub fn register_resource(
        &mut self,
        server: &str,
        resource: McpResourceInfo,
        connection: Arc<dyn McpConnection>,
    ) {
        self.route(resource.uri.clone(), server, connection);
        let uri = resource.uri.clone();
        upsert(&mut self.resources, resource, |r| r.uri == uri);
    }

    /// Find the route for a tool name, prompt name or resource URI.
    pub fn lookup(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    /// Shorthand for the connection behind [`lookup`](Self::lookup).
    pub fn connection(&self, name: &str) -> Option<Arc<dyn McpConnection>> {
        self.lookup(name).map(|r| Arc::clone(&r.connection))
    }

    /// Tool definitions to advertise to the model.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(McpToolInfo::to_definition).collect()
    }

    pub fn tools(&self) -> &[McpToolInfo] {
        &self.tools
    }

    pub fn prompts(&self) -> &[McpPromptInfo] {
        &self.prompts
    }

    pub fn resources(&self) -> &[McpResourceInfo] {
        &self.resources
    }

    /// Number of routed names.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::MockMcpConnection;

    fn conn() -> Arc<dyn McpConnection> {
        let mut mock = MockMcpConnection::new();
        mock.expect_is_alive().return_const(true);
        Arc::new(mock)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = CapabilityRegistry::new();
        registry.register_tool("research", McpToolInfo::new("search_papers", "Search"), conn());
        registry.register_prompt(
            "research",
            McpPromptInfo::new("generate_search_prompt", "Prompt"),
            conn(),
        );
        registry.register_resource("research", McpResourceInfo::new("papers://folders"), conn());

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup("search_papers").unwrap().server, "research");
        assert!(registry.lookup("papers://folders").is_some());
        assert!(registry.lookup("missing").is_none());
        assert!(registry.connection("generate_search_prompt").is_some());
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = CapabilityRegistry::new();
        registry.register_tool("a", McpToolInfo::new("fetch", "from a"), conn());
        registry.register_tool("b", McpToolInfo::new("fetch", "from b"), conn());

        assert_eq!(registry.lookup("fetch").unwrap().server, "b");
        // One catalog entry, with the later description.
        assert_eq!(registry.tools().len(), 1);
        assert_eq!(registry.tool_definitions()[0].description, "from b");
    }

    #[test]
    fn test_prompt_shadows_tool_route() {
        let mut registry = CapabilityRegistry::new();
        registry.register_tool("a", McpToolInfo::new("summarize", "tool"), conn());
        registry.register_prompt("b", McpPromptInfo::new("summarize", "prompt"), conn());

        assert_eq!(registry.lookup("summarize").unwrap().server, "b");
        assert_eq!(registry.tools().len(), 1);
        assert_eq!(registry.prompts().len(), 1);
    }

    #[test]
    fn test_catalog_keeps_first_seen_order() {
        let mut registry = CapabilityRegistry::new();
        registry.register_tool("a", McpToolInfo::new("one", ""), conn());
        registry.register_tool("a", McpToolInfo::new("two", ""), conn());
        registry.register_tool("b", McpToolInfo::new("one", "again"), conn());

        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn test_dead_routes_are_kept() {
        let mut dead = MockMcpConnection::new();
        dead.expect_is_alive().return_const(false);

        let mut registry = CapabilityRegistry::new();
        registry.register_tool("gone", McpToolInfo::new("search_papers", ""), Arc::new(dead));

        let route = registry.lookup("search_papers").unwrap();
        assert!(!route.connection.is_alive());
    }
}
