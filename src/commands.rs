// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! User input parsing.
//!
//! Three kinds of input are recognized:
//!
//! - `@topic` reads the resource `papers://topic` (`@folders` lists topics)
//! - `/prompts` and `/prompt <name> key=value ...` work with prompt templates
//! - anything else is a natural-language query for the agent

use serde_json::{Map, Value};

/// Reply to a bare `/`.
pub const INVALID_COMMAND: &str = "Invalid command. Try `/prompts` or `/prompt <name>`";

/// Reply to `/prompt` without a name.
pub const PROMPT_USAGE: &str = "Usage: `/prompt <name> arg1=value1 arg2=value2`";

/// URI scheme of paper resources.
pub const RESOURCE_SCHEME: &str = "papers://";

/// Help text listing every command.
pub const HELP_TEXT: &str = "**Commands:**\n\
- Type naturally to search papers\n\
- `@folders` - See all available topics\n\
- `@<topic>` - View papers on a specific topic\n\
- `/prompts` - List all prompt templates\n\
- `/prompt <name> arg1=value1` - Execute a prompt\n\
- `/help` - Show this help\n\
- `/quit` - Exit";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Natural-language question for the agent.
    Query(String),
    /// Read a resource by URI.
    Resource(String),
    /// List prompt templates.
    ListPrompts,
    /// Render a prompt and answer it.
    ExecutePrompt {
        name: String,
        arguments: Map<String, Value>,
    },
    /// Show the command list.
    Help,
    /// Leave the session.
    Quit,
    /// Input that cannot be run; the text is shown to the user.
    Invalid(String),
}

/// Parse one line of input. Blank input yields `None`.
pub fn parse_command(input: &str) -> Option<Command> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(topic) = input.strip_prefix('@') {
        return Some(Command::Resource(resource_uri(topic.trim())));
    }

    let Some(body) = input.strip_prefix('/') else {
        return Some(Command::Query(input.to_string()));
    };

    let body = body.trim_start();
    let (command, rest) = split_word(body);

    let parsed = match command {
        "" => Command::Invalid(INVALID_COMMAND.to_string()),
        "prompts" => Command::ListPrompts,
        "prompt" => {
            let (name, args) = split_word(rest);
            if name.is_empty() {
                Command::Invalid(PROMPT_USAGE.to_string())
            } else {
                match parse_prompt_args(args) {
                    Ok(arguments) => Command::ExecutePrompt {
                        name: name.to_string(),
                        arguments,
                    },
                    Err(message) => Command::Invalid(message),
                }
            }
        }
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("Unknown command: `{}`", other)),
    };
    Some(parsed)
}

/// Resource URI for an `@topic` shorthand.
pub fn resource_uri(topic: &str) -> String {
    if topic == "folders" {
        format!("{}folders", RESOURCE_SCHEME)
    } else {
        format!("{}{}", RESOURCE_SCHEME, topic)
    }
}

/// Parse `key=value` prompt arguments.
///
/// A value may be quoted with `'` or `"` to include spaces; a quote only
/// opens at the start of a token or right after its first `=`, so an
/// apostrophe inside a value is kept as is. Unquoted values that parse as
/// integers (`_` digit separators allowed) become JSON numbers; everything
/// else stays a string. Tokens without `=` or with an empty key are ignored, and a repeated
/// key keeps its last value.
pub fn parse_prompt_args(input: &str) -> Result<Map<String, Value>, String> {
    let mut args = Map::new();
    for token in tokenize(input)? {
        let Some((key, value)) = token.text.split_once('=') else {
            tracing::debug!(token = %token.text, "Ignoring prompt argument without '='");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        args.insert(key.to_string(), coerce(value, token.quoted));
    }
    Ok(args)
}

fn coerce(value: &str, quoted: bool) -> Value {
    if !quoted {
        if let Some(n) = parse_int(value) {
            return Value::from(n);
        }
    }
    Value::from(value)
}

/// Integer with optional sign and single `_` separators between digits.
fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    value.replace('_', "").parse().ok()
}

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

struct Token {
    text: String,
    /// Whether any part of the token was quoted.
    quoted: bool,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quote: Option<char> = None;

    for ch in input.chars() {
        match ch {
            '"' | '\'' => match in_quote {
                Some(q) if q == ch => in_quote = None,
                Some(_) => current.push(ch),
                None if !quoted && opens_value(&current) => {
                    in_quote = Some(ch);
                    quoted = true;
                }
                None => current.push(ch),
            },
            c if c.is_whitespace() && in_quote.is_none() => {
                if !current.is_empty() || quoted {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        quoted,
                    });
                    quoted = false;
                }
            }
            _ => current.push(ch),
        }
    }

    if let Some(q) = in_quote {
        return Err(format!("Unclosed quote ({}) in prompt arguments.", q));
    }
    if !current.is_empty() || quoted {
        tokens.push(Token {
            text: current,
            quoted,
        });
    }
    Ok(tokens)
}

/// Whether a quote seen after `current` starts a quoted token or value.
fn opens_value(current: &str) -> bool {
    current.is_empty() || (current.ends_with('=') && current.matches('=').count() == 1)
}
