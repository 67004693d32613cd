// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OpenAI-compatible provider implementation.
//!
//! This module provides a [`Provider`] implementation for any endpoint that
//! speaks the Chat Completions API: Groq (the default), OpenAI, Ollama and
//! other compatible servers.
//!
//! # Supported Endpoints
//!
//! - **Groq** - `https://api.groq.com/openai/v1` (default)
//! - **OpenAI** - `https://api.openai.com/v1`
//! - **Ollama** - `http://localhost:11434/v1` (no API key needed)
//! - **Any OpenAI-compatible** - Just set base_url
//!
//! Requests are non-streaming. Tool definitions are sent with
//! `tool_choice: "auto"`; the field is omitted when there are no tools.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use tracing::debug;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::DEFAULT_MAX_TOKENS;
use crate::error::ProviderError;
use crate::types::{
    Message, Provider, ProviderConfig, ProviderResponse, Role, StopReason, TokenUsage, ToolCall,
    ToolDefinition,
};

/// Default Groq API base URL.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Ollama API base URL.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// OpenAI-compatible provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: Option<f32>,
    provider_name: String,
}

impl OpenAIProvider {
    /// Create a new provider.
    ///
    /// Fails only if the HTTP client cannot be built (for example when the
    /// system TLS backend is unavailable).
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        config: ProviderConfig,
    ) -> Result<Self, ProviderError> {
        let timeout = config
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let provider_name = Self::detect_provider_name(&base_url);

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url,
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: config.temperature,
            provider_name,
        })
    }

    /// Create a provider for Groq.
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(
            Some(api_key.into()),
            model,
            GROQ_BASE_URL,
            ProviderConfig::default(),
        )
    }

    /// Create a provider for OpenAI.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(
            Some(api_key.into()),
            model,
            OPENAI_BASE_URL,
            ProviderConfig::default(),
        )
    }

    /// Create a provider for Ollama (no API key needed).
    pub fn ollama(model: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(None, model, OLLAMA_BASE_URL, ProviderConfig::default())
    }

    /// Detect provider name from base URL.
    fn detect_provider_name(base_url: &str) -> String {
        if base_url.contains("groq") {
            "Groq".to_string()
        } else if base_url.contains("openai.com") {
            "OpenAI".to_string()
        } else if base_url.contains("localhost:11434") || base_url.contains("ollama") {
            "Ollama".to_string()
        } else if base_url.contains("together") {
            "Together".to_string()
        } else {
            "OpenAI-Compatible".to_string()
        }
    }

    /// Build the request body for the Chat Completions API.
    fn build_request(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        system_prompt: Option<&str>,
    ) -> ChatRequest {
        let mut api_messages: Vec<ChatMessage> = Vec::with_capacity(messages.len() + 1);

        if let Some(system) = system_prompt {
            api_messages.push(ChatMessage::text("system", system));
        }
        api_messages.extend(messages.iter().map(ChatMessage::from));

        let tools: Option<Vec<ChatTool>> = tools
            .filter(|t| !t.is_empty())
            .map(|t| t.iter().map(ChatTool::from).collect());
        let tool_choice = tools.as_ref().map(|_| "auto".to_string());

        ChatRequest {
            model: self.model.clone(),
            messages: api_messages,
            tools,
            tool_choice,
            max_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        }
    }

    /// Map an error response from the API.
    fn handle_error_response(&self, status_code: u16, body: &str) -> ProviderError {
        let Ok(error) = serde_json::from_str::<ApiError>(body) else {
            return match status_code {
                401 | 403 => ProviderError::AuthError(body.to_string()),
                429 => ProviderError::RateLimited(body.to_string()),
                _ => ProviderError::api(body.to_string(), status_code),
            };
        };

        let message = error.error.message;
        let kind = error.error.code.as_deref().or(error.error.error_type.as_deref());
        match (kind, status_code) {
            (Some("authentication_error" | "invalid_api_key"), _) | (_, 401) => {
                ProviderError::AuthError(message)
            }
            (Some("rate_limit_error" | "rate_limit_exceeded"), _) | (_, 429) => {
                ProviderError::RateLimited(message)
            }
            (Some("model_not_found"), _) => ProviderError::ModelNotFound(message),
            (Some("context_length_exceeded"), _) => ProviderError::ContextWindowExceeded(message),
            _ => ProviderError::api(message, status_code),
        }
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        system_prompt: Option<&str>,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = self.build_request(messages, tools, system_prompt);
        let start = Instant::now();
        #[cfg(feature = "telemetry")]
        let operation_name = format!("{}.chat", self.provider_name.to_lowercase().replace(' ', "_"));

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "Sending chat request"
        );

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("content-type", "application/json");

        if let Some(ref api_key) = self.api_key {
            req = req.header("authorization", format!("Bearer {}", api_key));
        }

        let response = req.json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(start.elapsed().as_millis() as u64)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            #[cfg(feature = "telemetry")]
            GLOBAL_METRICS.record_operation(&operation_name, start.elapsed());
            return Err(self.handle_error_response(status.as_u16(), &error_text));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let provider_response: ProviderResponse = api_response.into();

        debug!(
            tool_calls = provider_response.tool_calls.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Chat response received"
        );

        #[cfg(feature = "telemetry")]
        {
            GLOBAL_METRICS.record_operation(&operation_name, start.elapsed());
            if let Some(ref usage) = provider_response.usage {
                GLOBAL_METRICS.record_tokens(usage.input_tokens as u64, usage.output_tokens as u64);
            }
        }

        Ok(provider_response)
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Request body for Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat message format.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

/// Tool call in a message.
#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    call_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function: Option<ChatFunction>,
}

/// Function details in a tool call.
#[derive(Debug, Serialize, Deserialize)]
struct ChatFunction {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<String>,
}

/// Tool definition in Chat API format.
#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatToolFunction,
}

/// Function definition within a tool.
#[derive(Debug, Serialize)]
struct ChatToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

/// Token usage.
#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ============================================================================
// Type Conversions
// ============================================================================

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::System => "system",
        };

        let tool_calls = msg.has_tool_calls().then(|| {
            msg.tool_calls
                .iter()
                .map(|tc| ChatToolCall {
                    id: Some(tc.id.clone()),
                    call_type: Some("function".to_string()),
                    function: Some(ChatFunction {
                        name: Some(tc.name.clone()),
                        arguments: Some(tc.arguments.clone()),
                    }),
                })
                .collect()
        });

        Self {
            role: role.to_string(),
            content: msg.content.clone(),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
            name: msg.name.clone(),
        }
    }
}

impl From<&ToolDefinition> for ChatTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: ChatToolFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

impl From<ChatResponse> for ProviderResponse {
    fn from(response: ChatResponse) -> Self {
        let usage = response.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        let Some(choice) = response.choices.into_iter().next() else {
            return Self {
                usage,
                ..Self::empty()
            };
        };

        // Calls without an id or name cannot be answered, so they are dropped.
        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| {
                let id = tc.id?;
                let func = tc.function?;
                let name = func.name?;
                Some(ToolCall::new(id, name, func.arguments.unwrap_or_default()))
            })
            .collect();

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            _ if !tool_calls.is_empty() => StopReason::ToolUse,
            _ => StopReason::EndTurn,
        };

        Self {
            content: choice.message.content,
            tool_calls,
            stop_reason,
            usage,
        }
    }
}
