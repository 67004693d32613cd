// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chat sessions and the runtime that owns the server connections.
//!
//! [`Assistant`] is created once per process: it connects every configured
//! server, freezes the capability registry and hands out [`ChatSession`]s.
//! A session turns raw user input into one [`Reply`]; it runs one query at a
//! time and keeps no state between them.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::agent::{Agent, AgentCallbacks, AgentConfig, AgentOptions};
use crate::commands::{parse_command, Command, HELP_TEXT};
use crate::dispatch::Dispatcher;
use crate::mcp::{
    CapabilityRegistry, ConnectionManager, DiscoveryReport, McpConfig, McpError,
};
use crate::types::SharedProvider;

/// Shown when a session starts.
pub const WELCOME_TEXT: &str = "# MCP Research Assistant\n\n\
Welcome! I can help you search and analyze academic papers.";

/// What a session sends back for one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Markdown text for the user.
    Message(String),
    /// A failed query, already rendered as `**Error:** ...`.
    Error(String),
    /// The user asked to leave.
    Exit,
}

impl Reply {
    /// Text to display. Empty for [`Reply::Exit`].
    pub fn text(&self) -> &str {
        match self {
            Self::Message(text) | Self::Error(text) => text,
            Self::Exit => "",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// One user's conversation context.
pub struct ChatSession {
    id: String,
    agent: Arc<Agent>,
    dispatcher: Dispatcher,
}

impl ChatSession {
    pub fn new(agent: Arc<Agent>) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(agent.registry()));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent,
            dispatcher,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Handle one line of input. Blank input gets no reply.
    pub async fn handle_input(&mut self, input: &str) -> Option<Reply> {
        let command = parse_command(input)?;
        Some(self.run(command, None).await)
    }

    /// Like [`handle_input`](Self::handle_input), but a query gives up once
    /// `cancel_rx` reads `true`.
    pub async fn handle_input_with_cancel(
        &mut self,
        input: &str,
        cancel_rx: watch::Receiver<bool>,
    ) -> Option<Reply> {
        let command = parse_command(input)?;
        Some(self.run(command, Some(cancel_rx)).await)
    }

    /// Run an already parsed command.
    pub async fn run(
        &mut self,
        command: Command,
        cancel_rx: Option<watch::Receiver<bool>>,
    ) -> Reply {
        match command {
            Command::Query(query) => {
                let result = match cancel_rx {
                    Some(rx) => self.agent.process_query_with_cancel(&query, rx).await,
                    None => self.agent.process_query(&query).await,
                };
                match result {
                    Ok(answer) => Reply::Message(answer),
                    Err(e) => {
                        warn!(session = %self.id, error = %e, "Query failed");
                        Reply::Error(format!("**Error:** {}", e))
                    }
                }
            }
            Command::Resource(uri) => Reply::Message(self.dispatcher.get_resource(&uri).await),
            Command::ListPrompts => Reply::Message(self.dispatcher.list_prompts()),
            Command::ExecutePrompt { name, arguments } => Reply::Message(
                self.dispatcher
                    .execute_prompt(&self.agent, &name, arguments)
                    .await,
            ),
            Command::Help => Reply::Message(HELP_TEXT.to_string()),
            Command::Quit => Reply::Exit,
            Command::Invalid(message) => Reply::Message(message),
        }
    }
}

/// Process-wide runtime: server connections, registry and provider.
pub struct Assistant {
    manager: ConnectionManager,
    registry: Arc<CapabilityRegistry>,
    reports: Vec<DiscoveryReport>,
    provider: SharedProvider,
    config: AgentConfig,
    callbacks: AgentCallbacks,
}

impl Assistant {
    /// Connect every enabled server and freeze the registry.
    ///
    /// Fails with the first server that cannot be started; servers already
    /// running are shut down first.
    pub async fn start(
        servers: &McpConfig,
        provider: SharedProvider,
        config: AgentConfig,
    ) -> Result<Self, McpError> {
        let mut manager = ConnectionManager::new();
        let reports = manager.connect_all(servers).await?;
        let assistant = Self::from_manager(manager, provider, config).with_reports(reports);

        info!(
            servers = assistant.reports.len(),
            capabilities = assistant.registry.len(),
            provider = assistant.provider.name(),
            model = assistant.provider.model(),
            "Assistant ready"
        );
        Ok(assistant)
    }

    /// Wrap a manager whose connections are already discovered.
    pub fn from_manager(manager: ConnectionManager, provider: SharedProvider, config: AgentConfig) -> Self {
        let registry = manager.snapshot();
        Self {
            manager,
            registry,
            reports: Vec::new(),
            provider,
            config,
            callbacks: AgentCallbacks::default(),
        }
    }

    fn with_reports(mut self, reports: Vec<DiscoveryReport>) -> Self {
        self.reports = reports;
        self
    }

    /// Callbacks given to every session created afterwards.
    pub fn with_callbacks(mut self, callbacks: AgentCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Start a new session sharing this runtime's registry and provider.
    pub fn session(&self) -> ChatSession {
        let agent = Agent::new(AgentOptions {
            provider: Arc::clone(&self.provider),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
            callbacks: self.callbacks.clone(),
        });
        ChatSession::new(Arc::new(agent))
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Per-server discovery results from [`start`](Self::start).
    pub fn reports(&self) -> &[DiscoveryReport] {
        &self.reports
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    /// Close every server connection.
    pub async fn shutdown(&mut self) {
        self.manager.shutdown().await;
    }
}
