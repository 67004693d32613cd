// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging and metrics infrastructure.
//!
//! - **Logging**: `tracing` events written to stderr through a
//!   `tracing_subscriber` fmt layer, filtered by `RUST_LOG` or the CLI flags.
//! - **Metrics**: in-process counters for tool calls, LLM completions and
//!   server operations, printed by the binary with `--stats`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use papertrail::telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::for_cli(verbose, debug))?;
//! ```
//!
//! Metrics recording is compiled in only with the `telemetry` feature:
//!
//! ```rust,ignore
//! #[cfg(feature = "telemetry")]
//! GLOBAL_METRICS.record_tool("search_papers", elapsed, true);
//! ```

mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryConfig};
pub use metrics::{LatencyStats, Metrics, MetricsSnapshot, ToolStats, GLOBAL_METRICS};
