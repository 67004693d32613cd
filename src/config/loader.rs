// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::WorkspaceConfig;

/// Workspace config file names, searched in order.
pub const CONFIG_FILES: &[&str] = &[
    "papertrail.json",
    ".papertrail.json",
    "papertrail.yaml",
    "papertrail.yml",
];

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".papertrail";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Load global configuration from `~/.papertrail/config.json`.
pub fn load_global_config() -> Result<Option<WorkspaceConfig>, ConfigError> {
    match get_global_config_path() {
        Some(path) if path.exists() => load_config_file(&path).map(Some),
        _ => Ok(None),
    }
}

/// Load the first workspace config file found in `workspace_root`.
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<WorkspaceConfig>, ConfigError> {
    match find_workspace_config(workspace_root) {
        Some(path) => load_config_file(&path).map(Some),
        None => Ok(None),
    }
}

/// Path of the workspace config file that would be loaded, if any.
pub fn find_workspace_config(workspace_root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.exists())
}

/// Load a configuration file, JSON or YAML by extension.
pub fn load_config_file(path: &Path) -> Result<WorkspaceConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::parse(path, e)),
        _ => serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e)),
    }
}
