// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Precedence, highest first: CLI options, workspace file, global file,
//! defaults.

use std::path::PathBuf;

use super::types::{ResolvedConfig, WorkspaceConfig};

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub server_config: Option<PathBuf>,
    pub max_iterations: Option<usize>,
}

/// Merge configuration sources into a resolved configuration.
pub fn merge_config(
    global: Option<WorkspaceConfig>,
    workspace: Option<WorkspaceConfig>,
    cli: CliOptions,
) -> ResolvedConfig {
    let mut result = ResolvedConfig::default();

    for config in [global, workspace].into_iter().flatten() {
        apply_workspace_config(&mut result, config);
    }

    apply_cli_options(&mut result, cli);
    result
}

fn apply_workspace_config(result: &mut ResolvedConfig, config: WorkspaceConfig) {
    if let Some(provider) = config.provider {
        result.provider = provider;
    }
    if config.model.is_some() {
        result.model = config.model;
    }
    if config.base_url.is_some() {
        result.base_url = config.base_url;
    }
    if config.temperature.is_some() {
        result.temperature = config.temperature;
    }
    if config.max_tokens.is_some() {
        result.max_tokens = config.max_tokens;
    }
    if let Some(n) = config.max_iterations {
        result.max_iterations = n;
    }
    if let Some(secs) = config.llm_timeout_secs {
        result.llm_timeout_secs = secs;
    }
    if let Some(path) = config.server_config {
        result.server_config = path;
    }
    if config.system_prompt.is_some() {
        result.system_prompt = config.system_prompt;
    }
}

fn apply_cli_options(result: &mut ResolvedConfig, cli: CliOptions) {
    if let Some(provider) = cli.provider {
        result.provider = provider;
        // A model chosen for another provider rarely exists on this one.
        if cli.model.is_none() {
            result.model = None;
        }
    }
    if cli.model.is_some() {
        result.model = cli.model;
    }
    if cli.base_url.is_some() {
        result.base_url = cli.base_url;
    }
    if let Some(path) = cli.server_config {
        result.server_config = path;
    }
    if let Some(n) = cli.max_iterations {
        result.max_iterations = n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_defaults() {
        let config = merge_config(None, None, CliOptions::default());
        assert_eq!(config, ResolvedConfig::default());
    }

    #[test]
    fn test_workspace_overrides_global() {
        let global = WorkspaceConfig {
            provider: Some("openai".to_string()),
            temperature: Some(0.2),
            ..Default::default()
        };
        let workspace = WorkspaceConfig {
            provider: Some("ollama".to_string()),
            ..Default::default()
        };

        let config = merge_config(Some(global), Some(workspace), CliOptions::default());
        assert_eq!(config.provider, "ollama");
        // Fields the workspace leaves unset fall through to global.
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_cli_overrides_everything() {
        let workspace = WorkspaceConfig {
            provider: Some("openai".to_string()),
            model: Some("gpt-4o".to_string()),
            max_iterations: Some(3),
            ..Default::default()
        };
        let cli = CliOptions {
            provider: Some("groq".to_string()),
            server_config: Some(PathBuf::from("/etc/servers.json")),
            max_iterations: Some(7),
            ..Default::default()
        };

        let config = merge_config(None, Some(workspace), cli);
        assert_eq!(config.provider, "groq");
        assert_eq!(config.model, None);
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.server_config, PathBuf::from("/etc/servers.json"));
    }

    #[test]
    fn test_cli_provider_and_model_together() {
        let cli = CliOptions {
            provider: Some("openai".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            ..Default::default()
        };
        let config = merge_config(None, None, cli);
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
    }
}
