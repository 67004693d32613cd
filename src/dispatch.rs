// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Direct prompt and resource access.
//!
//! Users can list prompt templates, run one through the agent, or read a
//! resource without involving the model. Every outcome, failures included,
//! comes back as display text.

use std::fmt::Write as _;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::mcp::CapabilityRegistry;

/// Listing shown when no server advertises prompts.
pub const NO_PROMPTS: &str = "No prompts available.";

/// Resource read that returned nothing textual.
pub const NO_CONTENT: &str = "No content available.";

/// Prompt and resource operations over a frozen registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// Markdown listing of every known prompt and its arguments.
    pub fn list_prompts(&self) -> String {
        let prompts = self.registry.prompts();
        if prompts.is_empty() {
            return NO_PROMPTS.to_string();
        }

        let mut out = String::from("**Available Prompts:**\n\n");
        for prompt in prompts {
            let _ = writeln!(out, "**{}**", prompt.name);
            if let Some(description) = prompt.description.as_deref().filter(|d| !d.is_empty()) {
                let _ = writeln!(out, "_{}_", description);
            }
            if !prompt.arguments.is_empty() {
                out.push_str("Arguments:\n");
                for arg in &prompt.arguments {
                    let need = if arg.required { "required" } else { "optional" };
                    let _ = writeln!(out, "  - `{}` ({})", arg.name, need);
                }
            }
            out.push('\n');
        }
        out
    }

    /// Render a prompt on its server and answer it as a query.
    pub async fn execute_prompt(
        &self,
        agent: &Agent,
        name: &str,
        arguments: Map<String, Value>,
    ) -> String {
        let Some(route) = self.registry.lookup(name) else {
            return format!("Prompt '{}' not found.", name);
        };

        debug!(prompt = name, server = %route.server, "Rendering prompt");
        let rendered = match route.connection.get_prompt(name, arguments).await {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(prompt = name, error = %e, "Prompt rendering failed");
                return format!("Error executing prompt: {}", e);
            }
        };

        let Some(first) = rendered.messages.first() else {
            return format!("Prompt '{}' returned no messages.", name);
        };

        match agent.process_query(&first.content.to_prompt_text()).await {
            Ok(answer) => answer,
            Err(e) => format!("Error executing prompt: {}", e),
        }
    }

    /// Read a resource by URI. Unknown URIs make no server call.
    pub async fn get_resource(&self, uri: &str) -> String {
        let Some(route) = self.registry.lookup(uri) else {
            return format!("Resource '{}' not found.", uri);
        };

        debug!(uri, server = %route.server, "Reading resource");
        match route.connection.read_resource(uri).await {
            Ok(result) => result
                .contents
                .into_iter()
                .next()
                .and_then(|c| c.text)
                .unwrap_or_else(|| NO_CONTENT.to_string()),
            Err(e) => {
                warn!(uri, error = %e, "Resource read failed");
                format!("Error fetching resource: {}", e)
            }
        }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }
}
