// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Subscriber setup.

use std::io;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Configuration for the global tracing subscriber.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Level used when neither `RUST_LOG` nor a directive is set.
    pub default_level: Level,

    /// Log span close events with their timings.
    pub include_span_events: bool,

    /// Include the module path of each event.
    pub include_target: bool,

    /// Use ANSI colors.
    pub ansi_colors: bool,

    /// Explicit filter directive. Takes precedence over `RUST_LOG`.
    pub filter_directive: Option<String>,
}

impl Default for TelemetryConfig {
    /// Quiet by default: the chat output owns stdout and only warnings
    /// reach stderr.
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            include_span_events: false,
            include_target: false,
            ansi_colors: true,
            filter_directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Connection and discovery events, per-query spans.
    pub fn development() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_span_events: true,
            include_target: true,
            ansi_colors: true,
            filter_directive: None,
        }
    }

    /// Warnings only, no colors.
    pub fn production() -> Self {
        Self {
            default_level: Level::WARN,
            include_span_events: false,
            include_target: false,
            ansi_colors: false,
            filter_directive: None,
        }
    }

    /// Everything from this crate, nothing from dependencies.
    pub fn testing() -> Self {
        Self {
            default_level: Level::TRACE,
            include_span_events: true,
            include_target: true,
            ansi_colors: false,
            filter_directive: Some("papertrail=trace".to_string()),
        }
    }

    /// Preset selected by the `-v` / `--debug` command line flags.
    pub fn for_cli(verbose: bool, debug: bool) -> Self {
        if debug {
            Self::development()
        } else if verbose {
            Self::default().with_level(Level::INFO)
        } else {
            Self::default()
        }
    }

    /// Set the default log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set a custom filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.default_level.to_string());
        match &self.filter_directive {
            Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// Events go to stderr so they never interleave with assistant replies.
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<()> {
    let span_events = if config.include_span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_span_events(span_events)
        .compact();

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}
