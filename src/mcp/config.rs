// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP server list configuration.
//!
//! Servers are read from `server_config.json` and connected in the order the
//! file lists them.
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "research": {
//!       "command": "uv",
//!       "args": ["run", "research_server.py"],
//!       "env": { "PAPER_DIR": "papers" },
//!       "tool_timeout_sec": 120
//!     },
//!     "fetch": {
//!       "command": "uvx",
//!       "args": ["mcp-server-fetch"],
//!       "disabled_tools": ["fetch_raw"]
//!     }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::McpError;

/// Ordered list of configured servers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct McpConfig {
    servers: Vec<(String, ServerConfig)>,
}

impl McpConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, McpError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            McpError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// Accepts `mcpServers` or `mcp_servers` as the top-level key. A file
    /// with neither configures no servers.
    pub fn from_json(json: &str) -> Result<Self, McpError> {
        let root: serde_json::Value = serde_json::from_str(json)?;

        let servers = match root.get("mcpServers").or_else(|| root.get("mcp_servers")) {
            None | Some(serde_json::Value::Null) => return Ok(Self::new()),
            Some(serde_json::Value::Object(map)) => map,
            Some(_) => {
                return Err(McpError::Config(
                    "'mcpServers' must be an object of server name to settings".to_string(),
                ))
            }
        };

        let mut config = Self::new();
        // serde_json is built with preserve_order, so this walks file order.
        for (name, value) in servers {
            let server: ServerConfig = serde_json::from_value(value.clone())
                .map_err(|e| McpError::Config(format!("Server '{}': {}", name, e)))?;
            config.add_server(name.clone(), server);
        }
        Ok(config)
    }

    /// All servers in file order.
    pub fn servers(&self) -> impl Iterator<Item = (&str, &ServerConfig)> {
        self.servers.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Enabled servers in file order.
    pub fn enabled_servers(&self) -> impl Iterator<Item = (&str, &ServerConfig)> {
        self.servers().filter(|(_, c)| c.enabled)
    }

    /// Look up a server by name.
    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Add a server, replacing an existing entry of the same name in place.
    pub fn add_server(&mut self, name: impl Into<String>, config: ServerConfig) {
        let name = name.into();
        match self.servers.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = config,
            None => self.servers.push((name, config)),
        }
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

/// How to launch one stdio MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Executable to spawn.
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables, added to the inherited environment.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Working directory for the child process.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Bound on spawn plus handshake, in seconds.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_sec: u64,

    /// Bound on every later request, in seconds.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_sec: u64,

    /// If non-empty, only these tools are registered.
    #[serde(default)]
    pub enabled_tools: Vec<String>,

    /// Tools never registered.
    #[serde(default)]
    pub disabled_tools: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_startup_timeout() -> u64 {
    30
}

fn default_tool_timeout() -> u64 {
    300
}

impl ServerConfig {
    /// Create a configuration that runs `command`.
    pub fn stdio(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
            enabled: true,
            startup_timeout_sec: default_startup_timeout(),
            tool_timeout_sec: default_tool_timeout(),
            enabled_tools: Vec::new(),
            disabled_tools: Vec::new(),
        }
    }

    /// Add command arguments.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Set environment variables.
    pub fn with_env(
        mut self,
        env: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.env = env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Set working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set both timeouts, in seconds.
    pub fn with_timeouts(mut self, startup_sec: u64, tool_sec: u64) -> Self {
        self.startup_timeout_sec = startup_sec;
        self.tool_timeout_sec = tool_sec;
        self
    }

    /// Restrict registration to these tools.
    pub fn with_enabled_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enabled_tools = tools.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Never register these tools.
    pub fn with_disabled_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.disabled_tools = tools.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Check if a tool passes the enabled/disabled filters.
    pub fn is_tool_enabled(&self, tool_name: &str) -> bool {
        if self.disabled_tools.iter().any(|t| t == tool_name) {
            return false;
        }
        self.enabled_tools.is_empty() || self.enabled_tools.iter().any(|t| t == tool_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_file_order() {
        let json = r#"{
            "mcpServers": {
                "zeta": { "command": "z" },
                "alpha": { "command": "a" },
                "mid": { "command": "m" }
            }
        }"#;

        let config = McpConfig::from_json(json).unwrap();
        let names: Vec<&str> = config.servers().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_full_entry() {
        let json = r#"{
            "mcpServers": {
                "research": {
                    "command": "uv",
                    "args": ["run", "research_server.py"],
                    "env": { "PAPER_DIR": "papers" },
                    "cwd": "/srv/research",
                    "startup_timeout_sec": 10,
                    "disabled_tools": ["extract_info"]
                }
            }
        }"#;

        let config = McpConfig::from_json(json).unwrap();
        let server = config.get("research").unwrap();
        assert_eq!(server.command, "uv");
        assert_eq!(server.args, vec!["run", "research_server.py"]);
        assert_eq!(server.env.get("PAPER_DIR").map(String::as_str), Some("papers"));
        assert_eq!(server.cwd, Some(PathBuf::from("/srv/research")));
        assert_eq!(server.startup_timeout_sec, 10);
        assert_eq!(server.tool_timeout_sec, 300);
        assert!(server.enabled);
        assert!(!server.is_tool_enabled("extract_info"));
        assert!(server.is_tool_enabled("search_papers"));
    }

    #[test]
    fn test_snake_case_alias() {
        let config = McpConfig::from_json(r#"{"mcp_servers": {"a": {"command": "x"}}}"#).unwrap();
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_missing_servers_key_is_empty() {
        let config = McpConfig::from_json("{}").unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_missing_command_names_server() {
        let err = McpConfig::from_json(r#"{"mcpServers": {"broken": {"args": []}}}"#).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_enabled_servers_skips_disabled() {
        let json = r#"{"mcpServers": {
            "on": {"command": "a"},
            "off": {"command": "b", "enabled": false}
        }}"#;
        let config = McpConfig::from_json(json).unwrap();
        let names: Vec<&str> = config.enabled_servers().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["on"]);
    }

    #[test]
    fn test_enabled_tools_whitelist() {
        let server = ServerConfig::stdio("x").with_enabled_tools(["search_papers"]);
        assert!(server.is_tool_enabled("search_papers"));
        assert!(!server.is_tool_enabled("extract_info"));
    }

    #[test]
    fn test_add_server_replaces_in_place() {
        let mut config = McpConfig::new();
        config.add_server("a", ServerConfig::stdio("one"));
        config.add_server("b", ServerConfig::stdio("two"));
        config.add_server("a", ServerConfig::stdio("three"));

        let entries: Vec<(&str, &str)> =
            config.servers().map(|(n, c)| (n, c.command.as_str())).collect();
        assert_eq!(entries, vec![("a", "three"), ("b", "two")]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("server_config.json");
        std::fs::write(&path, r#"{"mcpServers": {"research": {"command": "uv"}}}"#).unwrap();

        let config = McpConfig::load_from_file(&path).unwrap();
        assert!(config.get("research").is_some());

        let missing = McpConfig::load_from_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(McpError::Config(_))));
    }
}
