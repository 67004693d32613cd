// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! MCP wire types for capabilities and their results.
//!
//! Field names follow the protocol's camelCase JSON. Only the parts of each
//! message that the assistant uses are modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use super::error::McpError;
use crate::types::ToolDefinition;

/// MCP protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// Capabilities
// ============================================================================

/// A tool advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for the tool's arguments.
    #[serde(default = "empty_object_schema")]
    pub input_schema: serde_json::Value,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl McpToolInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: empty_object_schema(),
        }
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// The definition advertised to the model, schema passed through as is.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(&self.name, self.description.clone().unwrap_or_default())
            .with_parameters(self.input_schema.clone())
    }
}

/// One declared argument of a prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,
}

impl PromptArgument {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: false,
        }
    }
}

/// A prompt template advertised by `prompts/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPromptInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

impl McpPromptInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// A resource advertised by `resources/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpResourceInfo {
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl McpResourceInfo {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            description: None,
            mime_type: None,
        }
    }
}

// ============================================================================
// Content
// ============================================================================

/// One content item of a tool result or prompt message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpContent {
    Text {
        text: String,
    },

    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },

    /// Embedded resource contents.
    Resource { resource: ResourceContents },

    /// Any content type this client does not know.
    #[serde(other)]
    Unknown,
}

impl McpContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Textual representation of the item.
    ///
    /// Non-text items render as a short placeholder so the model still sees
    /// that something was returned.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Image { mime_type, .. } => format!("[image: {}]", mime_type),
            Self::Resource { resource } => match &resource.text {
                Some(text) => text.clone(),
                None => format!("[resource: {}]", resource.uri),
            },
            Self::Unknown => "[unsupported content]".to_string(),
        }
    }
}

/// Content as servers actually send it: a bare string, one item, or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPayload {
    Text(String),
    Items(Vec<McpContent>),
    Item(McpContent),
}

impl Default for ContentPayload {
    fn default() -> Self {
        Self::Items(Vec::new())
    }
}

impl ContentPayload {
    /// Normalize for a tool-result message: a single string, or a JSON array
    /// of the items' texts when there are several.
    pub fn to_tool_output(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Item(item) => item.to_text(),
            Self::Items(items) if items.len() == 1 => items[0].to_text(),
            Self::Items(items) => {
                let texts: Vec<String> = items.iter().map(McpContent::to_text).collect();
                serde_json::Value::from(texts).to_string()
            }
        }
    }

    /// Normalize for use as a query: item texts joined with spaces.
    pub fn to_prompt_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Item(item) => item.to_text(),
            Self::Items(items) => items
                .iter()
                .map(McpContent::to_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Result of `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: ContentPayload,

    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// A successful single-text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: ContentPayload::Items(vec![McpContent::text(text)]),
            is_error: false,
        }
    }

    /// A result the server flagged as a failure.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: ContentPayload::Items(vec![McpContent::text(text)]),
            is_error: true,
        }
    }

    /// Normalized output, or a tool failure carrying the server's text.
    pub fn into_output(self, tool: &str) -> Result<String, McpError> {
        let output = self.content.to_tool_output();
        if self.is_error {
            Err(McpError::tool_failed(tool, output))
        } else {
            Ok(output)
        }
    }
}

/// One message of a rendered prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: ContentPayload,
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetPromptResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub messages: Vec<PromptMessage>,
}

impl GetPromptResult {
    /// Single user message with text content.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            description: None,
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: ContentPayload::Item(McpContent::text(text)),
            }],
        }
    }
}

/// One entry of `resources/read` contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Base64 binary contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

/// Result of `resources/read`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    #[serde(default)]
    pub contents: Vec<ResourceContents>,
}

impl ReadResourceResult {
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            contents: vec![ResourceContents {
                uri: uri.into(),
                mime_type: Some("text/markdown".to_string()),
                text: Some(text.into()),
                blob: None,
            }],
        }
    }
}

// Paginated list results.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<McpToolInfo>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListPromptsResult {
    #[serde(default)]
    pub prompts: Vec<McpPromptInfo>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResourcesResult {
    #[serde(default)]
    pub resources: Vec<McpResourceInfo>,
    pub next_cursor: Option<String>,
}

// ============================================================================
// Server info
// ============================================================================

/// Server identity reported by `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            version: "0.0.0".to_string(),
        }
    }
}

/// Result of `initialize`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeResult {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub server_info: ServerInfo,
}

/// Liveness of a server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Handshake done, requests are served.
    Ready,
    /// The process exited or the connection was closed.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_info_from_wire() {
        let tool: McpToolInfo = serde_json::from_value(json!({
            "name": "search_papers",
            "description": "Search arXiv",
            "inputSchema": {
                "type": "object",
                "properties": { "topic": { "type": "string" } },
                "required": ["topic"]
            }
        }))
        .unwrap();

        let def = tool.to_definition();
        assert_eq!(def.name, "search_papers");
        assert_eq!(def.parameters["required"][0], "topic");
    }

    #[test]
    fn test_tool_info_missing_schema() {
        let tool: McpToolInfo = serde_json::from_value(json!({ "name": "ping" })).unwrap();
        assert_eq!(tool.input_schema["type"], "object");
        assert_eq!(tool.to_definition().description, "");
    }

    #[test]
    fn test_content_payload_shapes() {
        let text: ContentPayload = serde_json::from_value(json!("plain")).unwrap();
        assert_eq!(text, ContentPayload::Text("plain".to_string()));

        let item: ContentPayload =
            serde_json::from_value(json!({ "type": "text", "text": "one" })).unwrap();
        assert_eq!(item, ContentPayload::Item(McpContent::text("one")));

        let items: ContentPayload = serde_json::from_value(json!([
            { "type": "text", "text": "a" },
            { "type": "text", "text": "b" }
        ]))
        .unwrap();
        assert!(matches!(items, ContentPayload::Items(ref v) if v.len() == 2));
    }

    #[test]
    fn test_tool_output_normalization() {
        let single = ContentPayload::Items(vec![McpContent::text("2401.00001")]);
        assert_eq!(single.to_tool_output(), "2401.00001");

        let many = ContentPayload::Items(vec![McpContent::text("a"), McpContent::text("b")]);
        assert_eq!(many.to_tool_output(), r#"["a","b"]"#);

        assert_eq!(ContentPayload::Items(Vec::new()).to_tool_output(), "[]");
    }

    #[test]
    fn test_prompt_text_normalization() {
        let many = ContentPayload::Items(vec![McpContent::text("Find"), McpContent::text("papers")]);
        assert_eq!(many.to_prompt_text(), "Find papers");
        assert_eq!(ContentPayload::Text("raw".to_string()).to_prompt_text(), "raw");
    }

    #[test]
    fn test_unknown_content_type() {
        let item: McpContent =
            serde_json::from_value(json!({ "type": "audio", "data": "..." })).unwrap();
        assert_eq!(item, McpContent::Unknown);
        assert_eq!(item.to_text(), "[unsupported content]");
    }

    #[test]
    fn test_call_tool_result_is_error() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{ "type": "text", "text": "topic is required" }],
            "isError": true
        }))
        .unwrap();

        let err = result.into_output("search_papers").unwrap_err();
        assert!(err.to_string().contains("topic is required"));

        assert_eq!(CallToolResult::text("ok").into_output("t").unwrap(), "ok");
    }

    #[test]
    fn test_prompt_argument_required_defaults_false() {
        let prompt: McpPromptInfo = serde_json::from_value(json!({
            "name": "generate_search_prompt",
            "arguments": [{ "name": "topic", "required": true }, { "name": "num_papers" }]
        }))
        .unwrap();
        assert!(prompt.arguments[0].required);
        assert!(!prompt.arguments[1].required);
        assert!(prompt.description.is_none());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Ready.to_string(), "ready");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }
}
