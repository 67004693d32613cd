// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent module - the conversation orchestrator.
//!
//! The agent runs one user query through a bounded loop: send the history to
//! the model -> receive an assistant message -> route and run any tool calls
//! -> repeat, until the model answers without tools or the iteration budget
//! is spent.
//!
//! # Example
//!
//! ```rust,ignore
//! use papertrail::agent::{Agent, AgentCallbacks, AgentConfig, AgentOptions};
//!
//! let agent = Agent::new(AgentOptions {
//!     provider,
//!     registry: manager.snapshot(),
//!     config: AgentConfig::default(),
//!     callbacks: AgentCallbacks::default(),
//! });
//!
//! let answer = agent.process_query("Find recent papers on protein folding").await?;
//! println!("{}", answer);
//! ```

mod types;

pub use types::{
    AgentCallbacks, AgentConfig, AgentOptions, ConversationState, TurnStats, TurnToolCall,
    MAX_ITERATIONS_REACHED, NO_RESPONSE, TOOL_ERROR_PREFIX,
};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{AgentError, ProviderError};
use crate::mcp::CapabilityRegistry;
use crate::types::{Message, ProviderResponse, SharedProvider, ToolCall, ToolDefinition};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

/// The Agent orchestrates the conversation between the user, model, and tools.
///
/// An agent holds no conversation between queries, so one instance can serve
/// any number of sequential queries.
pub struct Agent {
    provider: SharedProvider,
    registry: Arc<CapabilityRegistry>,
    /// Tool definitions advertised on every call, taken once from the frozen registry.
    tools: Vec<ToolDefinition>,
    config: AgentConfig,
    callbacks: AgentCallbacks,
}

/// Outcome of one tool call.
struct ToolOutcome {
    content: String,
    is_error: bool,
    server: Option<String>,
}

impl ToolOutcome {
    fn failed(message: impl std::fmt::Display, server: Option<String>) -> Self {
        Self {
            content: format!("{}{}", TOOL_ERROR_PREFIX, message),
            is_error: true,
            server,
        }
    }
}

impl Agent {
    /// Create a new agent with the given options.
    pub fn new(options: AgentOptions) -> Self {
        let tools = options.registry.tool_definitions();
        Self {
            provider: options.provider,
            registry: options.registry,
            tools,
            config: options.config,
            callbacks: options.callbacks,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    /// Run one query to completion.
    pub async fn process_query(&self, query: &str) -> Result<String, AgentError> {
        self.run(query, None).await
    }

    /// Run one query, giving up with [`AgentError::Cancelled`] once `cancel_rx`
    /// reads `true`.
    ///
    /// Cancellation is observed while waiting on the model or a tool. A tool
    /// call already sent to a server is not recalled.
    pub async fn process_query_with_cancel(
        &self,
        query: &str,
        cancel_rx: watch::Receiver<bool>,
    ) -> Result<String, AgentError> {
        self.run(query, Some(cancel_rx)).await
    }

    async fn run(
        &self,
        query: &str,
        mut cancel_rx: Option<watch::Receiver<bool>>,
    ) -> Result<String, AgentError> {
        let start_time = Instant::now();
        let mut stats = TurnStats::default();
        let mut state = ConversationState::new(query);

        let answer = loop {
            if state.current_iteration >= self.config.max_iterations {
                warn!(
                    iterations = state.current_iteration,
                    "Iteration budget exhausted"
                );
                stats.exhausted = true;
                break MAX_ITERATIONS_REACHED.to_string();
            }
            state.current_iteration += 1;
            stats.iterations = state.current_iteration;

            let response =
                guarded(self.complete(state.messages()), cancel_rx.as_mut()).await??;

            if let Some(ref usage) = response.usage {
                stats.add_usage(usage);
            }

            state.push(Message::from_response(&response));

            if !response.has_tool_calls() {
                break response
                    .text_content()
                    .unwrap_or(NO_RESPONSE)
                    .to_string();
            }

            debug!(
                iteration = state.current_iteration,
                tool_calls = response.tool_calls.len(),
                "Model requested tools"
            );

            // Sequential: later calls may depend on earlier side effects.
            for call in &response.tool_calls {
                let started = Instant::now();
                let outcome = guarded(self.execute_tool(call), cancel_rx.as_mut()).await?;

                stats.tool_call_count += 1;
                stats.tool_calls.push(TurnToolCall {
                    name: call.name.clone(),
                    server: outcome.server,
                    duration_ms: started.elapsed().as_millis() as u64,
                    is_error: outcome.is_error,
                });

                state.push(Message::tool_result(&call.id, &call.name, outcome.content));
            }
        };

        stats.duration_ms = start_time.elapsed().as_millis() as u64;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("agent.query", start_time.elapsed());

        info!(
            iterations = stats.iterations,
            tool_calls = stats.tool_call_count,
            tokens = stats.total_tokens(),
            duration_ms = stats.duration_ms,
            "Query complete"
        );

        if let Some(ref on_turn_complete) = self.callbacks.on_turn_complete {
            on_turn_complete(&stats);
        }

        Ok(answer)
    }

    /// One completion, bounded by the configured LLM timeout.
    async fn complete(&self, messages: &[Message]) -> Result<ProviderResponse, ProviderError> {
        let tools = (!self.tools.is_empty()).then_some(self.tools.as_slice());
        let system_prompt = self.config.system_prompt.as_deref();
        let request = self.provider.chat(messages, tools, system_prompt);

        match self.config.llm_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ProviderError::Timeout(limit.as_millis() as u64))?,
            None => request.await,
        }
    }

    /// Route one tool call and turn whatever happens into tool-message text.
    async fn execute_tool(&self, call: &ToolCall) -> ToolOutcome {
        if let Some(ref on_tool_call) = self.callbacks.on_tool_call {
            on_tool_call(&call.id, &call.name, &call.arguments);
        }

        let outcome = self.dispatch_tool(call).await;

        if let Some(ref on_tool_result) = self.callbacks.on_tool_result {
            on_tool_result(&call.id, &call.name, &outcome.content, outcome.is_error);
        }

        outcome
    }

    async fn dispatch_tool(&self, call: &ToolCall) -> ToolOutcome {
        let Some(route) = self.registry.lookup(&call.name) else {
            warn!(tool = %call.name, "No server provides tool");
            #[cfg(feature = "telemetry")]
            GLOBAL_METRICS.record_unrouted();
            return ToolOutcome::failed(
                format!("no connected server provides tool '{}'", call.name),
                None,
            );
        };
        let server = Some(route.server.clone());

        let arguments = match call.parsed_arguments() {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Malformed tool arguments");
                return ToolOutcome::failed(
                    format!("invalid arguments for '{}': {}", call.name, e),
                    server,
                );
            }
        };

        debug!(tool = %call.name, server = %route.server, "Calling tool");
        let start = Instant::now();
        let result = route.connection.call_tool(&call.name, arguments).await;

        let outcome = match result {
            Ok(result) if result.is_error => {
                ToolOutcome::failed(result.content.to_tool_output(), server)
            }
            Ok(result) => ToolOutcome {
                content: result.content.to_tool_output(),
                is_error: false,
                server,
            },
            Err(e) => {
                warn!(tool = %call.name, server = %route.server, error = %e, "Tool call failed");
                ToolOutcome::failed(e, server)
            }
        };

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_tool(&call.name, start.elapsed(), !outcome.is_error);
        #[cfg(not(feature = "telemetry"))]
        let _ = start;

        outcome
    }
}

/// Resolve when the flag reads `true`. Never resolves if the sender is gone.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Await `fut`, or fail with [`AgentError::Cancelled`] if cancellation wins.
async fn guarded<F: Future>(
    fut: F,
    cancel_rx: Option<&mut watch::Receiver<bool>>,
) -> Result<F::Output, AgentError> {
    match cancel_rx {
        Some(rx) => tokio::select! {
            biased;
            _ = cancelled(rx) => Err(AgentError::Cancelled),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}
