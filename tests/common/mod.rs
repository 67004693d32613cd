// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared doubles for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use papertrail::agent::{Agent, AgentCallbacks, AgentConfig, AgentOptions};
use papertrail::error::ProviderError;
use papertrail::mcp::{
    CallToolResult, CapabilityRegistry, GetPromptResult, McpConnection, McpError, McpPromptInfo,
    McpResourceInfo, McpToolInfo, ReadResourceResult,
};
use papertrail::types::{Message, Provider, ProviderResponse, ToolDefinition};

/// Outcome a [`FakeServer`] returns for one tool.
#[derive(Clone)]
pub enum ToolBehavior {
    Reply(String),
    Flagged(String),
    Fail(String),
}

/// In-process MCP server with fixed catalogs. Records every call it serves.
#[derive(Default)]
pub struct FakeServer {
    pub tools: Vec<McpToolInfo>,
    pub prompts: Vec<McpPromptInfo>,
    pub resources: Vec<McpResourceInfo>,
    pub behaviors: HashMap<String, ToolBehavior>,
    pub prompt_text: HashMap<String, String>,
    pub resource_text: HashMap<String, String>,
    pub fail_listing: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(mut self, name: &str, behavior: ToolBehavior) -> Self {
        self.tools.push(McpToolInfo::new(name, format!("{} tool", name)));
        self.behaviors.insert(name.to_string(), behavior);
        self
    }

    pub fn prompt(mut self, prompt: McpPromptInfo, text: &str) -> Self {
        self.prompt_text.insert(prompt.name.clone(), text.to_string());
        self.prompts.push(prompt);
        self
    }

    pub fn resource(mut self, uri: &str, text: &str) -> Self {
        self.resources.push(McpResourceInfo::new(uri));
        self.resource_text.insert(uri.to_string(), text.to_string());
        self
    }

    pub fn failing_listings(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn listing<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, McpError> {
        if self.fail_listing {
            return Err(McpError::protocol(-32601, "Method not found"));
        }
        Ok(items.to_vec())
    }
}

#[async_trait]
impl McpConnection for FakeServer {
    fn is_alive(&self) -> bool {
        true
    }

    async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
        self.listing(&self.tools)
    }

    async fn list_prompts(&self) -> Result<Vec<McpPromptInfo>, McpError> {
        self.listing(&self.prompts)
    }

    async fn list_resources(&self) -> Result<Vec<McpResourceInfo>, McpError> {
        self.listing(&self.resources)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        self.record(format!("tool:{}:{}", name, arguments));
        match self.behaviors.get(name) {
            Some(ToolBehavior::Reply(text)) => Ok(CallToolResult::text(text.clone())),
            Some(ToolBehavior::Flagged(text)) => Ok(CallToolResult::error(text.clone())),
            Some(ToolBehavior::Fail(message)) => Err(McpError::protocol(-32603, message.clone())),
            None => Err(McpError::protocol(-32602, format!("Unknown tool: {}", name))),
        }
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<GetPromptResult, McpError> {
        self.record(format!("prompt:{}:{}", name, Value::Object(arguments)));
        match self.prompt_text.get(name) {
            Some(text) => Ok(GetPromptResult::user_text(text.clone())),
            None => Err(McpError::protocol(-32602, format!("Unknown prompt: {}", name))),
        }
    }

    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        self.record(format!("resource:{}", uri));
        match self.resource_text.get(uri) {
            Some(text) => Ok(ReadResourceResult::text(uri, text.clone())),
            None => Err(McpError::protocol(-32002, "Resource not found")),
        }
    }

    async fn close(&self) {}
}

/// Provider that plays back a fixed list of responses and records every
/// conversation it was sent.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    fallback: Option<ProviderResponse>,
    pub seen: Mutex<Vec<Vec<Message>>>,
    pub tools_seen: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: None,
            seen: Mutex::new(Vec::new()),
            tools_seen: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with the same response.
    pub fn repeating(response: ProviderResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_conversation(&self) -> Vec<Message> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        _system_prompt: Option<&str>,
    ) -> Result<ProviderResponse, ProviderError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.tools_seen
            .lock()
            .unwrap()
            .push(tools.map_or(0, |t| t.len()));

        let next = self.responses.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| ProviderError::api_message("script exhausted"))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

pub fn agent(registry: Arc<CapabilityRegistry>, provider: Arc<ScriptedProvider>) -> Agent {
    Agent::new(AgentOptions {
        provider,
        registry,
        config: AgentConfig::default(),
        callbacks: AgentCallbacks::default(),
    })
}
