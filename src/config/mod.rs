// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Application configuration.
//!
//! Sources, merged with precedence CLI > workspace > global > defaults:
//! - Global config: `~/.papertrail/config.json`
//! - Workspace config: `papertrail.json`, `.papertrail.json` or `papertrail.yaml`
//! - CLI options
//!
//! The MCP server list is a separate file, see [`crate::mcp::McpConfig`].

mod loader;
mod merger;
mod types;

pub use loader::{
    find_workspace_config, get_global_config_dir, get_global_config_path, load_config_file,
    load_global_config, load_workspace_config, CONFIG_FILES, GLOBAL_CONFIG_DIR,
    GLOBAL_CONFIG_FILE,
};
pub use merger::{merge_config, CliOptions};
pub use types::{
    ResolvedConfig, WorkspaceConfig, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_MAX_ITERATIONS,
    DEFAULT_SERVER_CONFIG,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load, merge and validate all configuration sources for a directory.
pub fn load_config(workspace_root: &Path, cli_options: CliOptions) -> Result<ResolvedConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;

    let config = merge_config(global, workspace, cli_options);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_with_workspace_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("papertrail.json"),
            r#"{"provider": "openai", "model": "gpt-4o-mini"}"#,
        )
        .unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_load_config_cli_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("papertrail.json"), r#"{"provider": "openai"}"#).unwrap();

        let cli = CliOptions {
            provider: Some("ollama".to_string()),
            ..Default::default()
        };
        let config = load_config(temp.path(), cli).unwrap();
        assert_eq!(config.provider, "ollama");
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("papertrail.json"), r#"{"maxIterations": 0}"#).unwrap();

        let err = load_config(temp.path(), CliOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
