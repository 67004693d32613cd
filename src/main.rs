// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Papertrail main entry point - CLI, subcommands, and REPL.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::watch;

use papertrail::agent::{AgentCallbacks, AgentConfig, TurnStats};
use papertrail::chat::{Assistant, ChatSession, Reply, WELCOME_TEXT};
use papertrail::commands::HELP_TEXT;
use papertrail::config::{self, CliOptions, ResolvedConfig};
use papertrail::mcp::{ConnectionManager, McpConfig};
use papertrail::providers::{create_provider_from_config, ProviderType};
use papertrail::telemetry::{init_telemetry, TelemetryConfig, GLOBAL_METRICS};

/// Papertrail version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest tool result echoed in verbose mode.
const RESULT_PREVIEW_CHARS: usize = 500;

/// Papertrail - search and read academic papers with an LLM.
#[derive(Parser)]
#[command(name = "papertrail")]
#[command(author, version, about = "Research assistant over MCP tool servers", long_about = None)]
struct Cli {
    /// LLM provider to use
    #[arg(short, long, env = "PAPERTRAIL_PROVIDER")]
    provider: Option<Provider>,

    /// Model to use
    #[arg(short, long, env = "PAPERTRAIL_MODEL")]
    model: Option<String>,

    /// Base URL for the completion API
    #[arg(long, env = "PAPERTRAIL_BASE_URL")]
    base_url: Option<String>,

    /// MCP server list (defaults to server_config.json)
    #[arg(short, long, env = "PAPERTRAIL_SERVERS")]
    servers: Option<std::path::PathBuf>,

    /// Maximum LLM round trips per query
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Run a single line of input and exit
    #[arg(short = 'P', long)]
    prompt: Option<String>,

    /// Print tool and token statistics on exit
    #[arg(long)]
    stats: bool,

    /// Show tool arguments and results
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available LLM providers.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Provider {
    /// Groq - hosted Llama models
    Groq,
    /// OpenAI - GPT models
    Openai,
    /// Ollama - local models
    Ollama,
    /// Any OpenAI-compatible endpoint (requires --base-url)
    OpenaiCompatible,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Groq => write!(f, "groq"),
            Provider::Openai => write!(f, "openai"),
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenaiCompatible => write!(f, "openai-compatible"),
        }
    }
}

impl From<Provider> for ProviderType {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Groq => ProviderType::Groq,
            Provider::Openai => ProviderType::OpenAI,
            Provider::Ollama => ProviderType::Ollama,
            Provider::OpenaiCompatible => ProviderType::OpenAICompatible,
        }
    }
}

/// Subcommands for papertrail.
#[derive(Subcommand)]
enum Commands {
    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Connect to every configured server and list what it offers
    Servers,

    /// Show version information
    Version,
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_telemetry(&TelemetryConfig::for_cli(cli.verbose, cli.debug))?;

    let cli_options = CliOptions {
        provider: cli.provider.map(|p| p.to_string()),
        model: cli.model,
        base_url: cli.base_url,
        server_config: cli.servers,
        max_iterations: cli.max_iterations,
    };

    let workspace_root = std::env::current_dir()?;
    let config = config::load_config(&workspace_root, cli_options)?;

    if let Some(command) = cli.command {
        return handle_command(command, &config).await;
    }

    let indicator = Indicator::default();
    let callbacks = tool_callbacks(cli.verbose, &indicator);
    let mut assistant = start_assistant(&config, callbacks).await?;

    let result = match cli.prompt {
        Some(prompt) => handle_prompt(&assistant, &prompt).await,
        None => run_repl(&assistant, &indicator).await,
    };

    assistant.shutdown().await;

    if cli.stats {
        eprintln!("{}", GLOBAL_METRICS.snapshot().format_report());
    }
    result
}

async fn handle_command(command: Commands, config: &ResolvedConfig) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("{}", serde_json::to_string_pretty(config)?);
            }
        },
        Commands::Servers => {
            let servers = McpConfig::load_from_file(&config.server_config)?;
            let mut manager = ConnectionManager::new();
            let reports = manager.connect_all(&servers).await?;

            for report in &reports {
                let status = if report.is_complete() {
                    "✓".green()
                } else {
                    "!".yellow()
                };
                println!(
                    "{} {} - {} tools, {} prompts, {} resources",
                    status,
                    report.server.bright_white().bold(),
                    report.tools,
                    report.prompts,
                    report.resources
                );
                if report.filtered_tools > 0 {
                    println!("    {} tools hidden by filters", report.filtered_tools);
                }
                for issue in &report.issues {
                    println!("    {}", issue.to_string().red());
                }
            }

            let registry = manager.registry();
            print_section("Tools", registry.tools().iter().map(|t| (&t.name, &t.description)));
            print_section(
                "Prompts",
                registry.prompts().iter().map(|p| (&p.name, &p.description)),
            );
            print_section(
                "Resources",
                registry.resources().iter().map(|r| (&r.uri, &r.description)),
            );

            manager.shutdown().await;
        }
        Commands::Version => {
            println!("papertrail {}", VERSION);
        }
    }
    Ok(())
}

fn print_section<'a>(
    title: &str,
    items: impl Iterator<Item = (&'a String, &'a Option<String>)>,
) {
    let items: Vec<_> = items.collect();
    if items.is_empty() {
        return;
    }
    println!("\n{}", format!("## {}", title).bright_cyan());
    for (name, description) in items {
        match description {
            Some(d) if !d.is_empty() => println!("  {} - {}", name.bright_white(), d.dimmed()),
            _ => println!("  {}", name.bright_white()),
        }
    }
}

async fn start_assistant(
    config: &ResolvedConfig,
    callbacks: AgentCallbacks,
) -> anyhow::Result<Assistant> {
    let servers = McpConfig::load_from_file(&config.server_config)?;
    let provider = create_provider_from_config(config)?;

    let assistant = Assistant::start(&servers, provider.into(), AgentConfig::from_resolved(config))
        .await?
        .with_callbacks(callbacks);

    for report in assistant.reports() {
        for issue in &report.issues {
            eprintln!("{} {}: {}", "warning:".yellow(), report.server, issue);
        }
    }
    Ok(assistant)
}

/// Run one line through a fresh session and print the reply.
async fn handle_prompt(assistant: &Assistant, prompt: &str) -> anyhow::Result<()> {
    let mut session = assistant.session();
    if let Some(reply) = session.handle_input(prompt).await {
        print_reply(&reply);
    }
    Ok(())
}

async fn run_repl(assistant: &Assistant, indicator: &Indicator) -> anyhow::Result<()> {
    println!("{}", WELCOME_TEXT.bright_cyan());
    println!(
        "Provider: {} ({})",
        assistant.provider().name().bright_magenta(),
        assistant.provider().model()
    );
    println!("\n{}\n", HELP_TEXT);

    let mut editor = DefaultEditor::new()?;
    let mut session = assistant.session();

    loop {
        let line = match editor.readline("› ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line.as_str());

        let Some(reply) = run_with_cancel(&mut session, &line, indicator).await else {
            continue;
        };
        if reply == Reply::Exit {
            break;
        }
        print_reply(&reply);
        println!();
    }

    println!("Goodbye!");
    Ok(())
}

/// Run one input with a spinner; Ctrl-C cancels the query in flight.
async fn run_with_cancel(
    session: &mut ChatSession,
    line: &str,
    indicator: &Indicator,
) -> Option<Reply> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    indicator.start("Thinking...");

    let reply = {
        let handled = session.handle_input_with_cancel(line, cancel_rx);
        tokio::pin!(handled);
        loop {
            tokio::select! {
                reply = &mut handled => break reply,
                _ = tokio::signal::ctrl_c() => {
                    let _ = cancel_tx.send(true);
                    indicator.set_message("Cancelling...");
                }
            }
        }
    };

    indicator.stop();
    reply
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Error(text) => eprintln!("{}", text.red()),
        Reply::Message(text) => println!("{}", text),
        Reply::Exit => {}
    }
}

/// Spinner shown while a query runs. Tool callbacks print through it so
/// their lines are not overdrawn.
#[derive(Clone, Default)]
struct Indicator(Arc<Mutex<Option<ProgressBar>>>);

impl Indicator {
    fn start(&self, message: &str) {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner()
            .with_style(style)
            .with_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(bar);
        }
    }

    fn set_message(&self, message: &str) {
        if let Ok(slot) = self.0.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_message(message.to_string());
            }
        }
    }

    fn println(&self, line: String) {
        match self.0.lock() {
            Ok(slot) => match slot.as_ref() {
                Some(bar) => bar.suspend(|| println!("{}", line)),
                None => println!("{}", line),
            },
            Err(_) => println!("{}", line),
        }
    }

    fn stop(&self) {
        if let Ok(mut slot) = self.0.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

/// Callbacks that report tool activity through the spinner.
fn tool_callbacks(verbose: bool, indicator: &Indicator) -> AgentCallbacks {
    let on_call = indicator.clone();
    let on_result = indicator.clone();
    let on_complete = indicator.clone();

    AgentCallbacks {
        on_tool_call: Some(Arc::new(move |_id: &str, name: &str, args: &str| {
            let mut line = format!("{} `{}`", "Using tool:".yellow(), name);
            if verbose {
                line.push_str(&format!("\n  {}", args.dimmed()));
            }
            on_call.println(line);
        })),
        on_tool_result: verbose.then(|| {
            Arc::new(move |_id: &str, _name: &str, content: &str, is_error: bool| {
                let marker = if is_error {
                    "✗ Failed:".red()
                } else {
                    "✓ Result:".green()
                };
                let mut preview: String = content.chars().take(RESULT_PREVIEW_CHARS).collect();
                if preview.len() < content.len() {
                    preview.push_str("...");
                }
                on_result.println(format!("{}\n  {}", marker, preview));
            }) as Arc<dyn Fn(&str, &str, &str, bool) + Send + Sync>
        }),
        on_turn_complete: verbose.then(|| {
            Arc::new(move |stats: &TurnStats| {
                on_complete.println(
                    format!(
                        "{} iterations, {} tool calls, {} tokens, {}ms",
                        stats.iterations,
                        stats.tool_call_count,
                        stats.total_tokens(),
                        stats.duration_ms
                    )
                    .dimmed()
                    .to_string(),
                );
            }) as Arc<dyn Fn(&TurnStats) + Send + Sync>
        }),
    }
}
