// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent types and configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ResolvedConfig, DEFAULT_MAX_ITERATIONS};
use crate::mcp::CapabilityRegistry;
use crate::types::{Message, SharedProvider, TokenUsage};

/// Reply when the model ends a turn without text.
pub const NO_RESPONSE: &str = "No response generated.";

/// Reply when the iteration budget runs out.
pub const MAX_ITERATIONS_REACHED: &str =
    "Maximum iterations reached. Please try again with a simpler query.";

/// Prefix of every failed tool result sent back to the model.
pub const TOOL_ERROR_PREFIX: &str = "Error calling tool: ";

/// Statistics for a single query (user message -> final response).
#[derive(Debug, Clone, Default)]
pub struct TurnStats {
    /// Number of LLM round trips.
    pub iterations: usize,
    /// Number of tool calls executed.
    pub tool_call_count: usize,
    /// Input tokens used.
    pub input_tokens: u64,
    /// Output tokens generated.
    pub output_tokens: u64,
    /// Duration of the query in milliseconds.
    pub duration_ms: u64,
    /// Individual tool call stats.
    pub tool_calls: Vec<TurnToolCall>,
    /// Whether the query ended by exhausting the iteration budget.
    pub exhausted: bool,
}

impl TurnStats {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub(crate) fn add_usage(&mut self, usage: &TokenUsage) {
        self.input_tokens += usage.input_tokens as u64;
        self.output_tokens += usage.output_tokens as u64;
    }
}

/// Statistics for a single tool call.
#[derive(Debug, Clone)]
pub struct TurnToolCall {
    /// Tool name.
    pub name: String,
    /// Server that handled the call, if one was found.
    pub server: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Whether the tool call resulted in an error.
    pub is_error: bool,
}

/// Callbacks for agent events.
///
/// Uses `Arc` so one set of callbacks can be shared by every session.
#[derive(Clone, Default)]
pub struct AgentCallbacks {
    /// Called when a tool is about to be executed (tool_id, tool_name, raw arguments).
    pub on_tool_call: Option<Arc<dyn Fn(&str, &str, &str) + Send + Sync>>,
    /// Called when a tool execution completes (tool_id, tool_name, result, is_error).
    pub on_tool_result: Option<Arc<dyn Fn(&str, &str, &str, bool) + Send + Sync>>,
    /// Called when a query completes with stats.
    pub on_turn_complete: Option<Arc<dyn Fn(&TurnStats) + Send + Sync>>,
}

impl std::fmt::Debug for AgentCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCallbacks")
            .field("on_tool_call", &self.on_tool_call.is_some())
            .field("on_tool_result", &self.on_tool_result.is_some())
            .field("on_turn_complete", &self.on_turn_complete.is_some())
            .finish()
    }
}

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum number of LLM round trips per query.
    pub max_iterations: usize,
    /// Bound on a single completion. `None` relies on the HTTP client timeout.
    pub llm_timeout: Option<Duration>,
    /// Optional system prompt. None is sent by default.
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            llm_timeout: None,
            system_prompt: None,
        }
    }
}

impl AgentConfig {
    /// Build from resolved application settings.
    pub fn from_resolved(config: &ResolvedConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            llm_timeout: Some(Duration::from_secs(config.llm_timeout_secs)),
            system_prompt: config.system_prompt.clone(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Options for creating an agent.
pub struct AgentOptions {
    /// LLM provider to use.
    pub provider: SharedProvider,
    /// Frozen capability registry.
    pub registry: Arc<CapabilityRegistry>,
    /// Agent configuration.
    pub config: AgentConfig,
    /// Event callbacks.
    pub callbacks: AgentCallbacks,
}

/// History of one query. Created fresh per query and dropped on return.
#[derive(Debug, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    /// Current iteration in the query.
    pub current_iteration: usize,
}

impl ConversationState {
    /// Start a conversation with one user message.
    pub fn new(query: &str) -> Self {
        Self {
            messages: vec![Message::user(query)],
            current_iteration: 0,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
