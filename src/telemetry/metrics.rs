// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-process metrics for tool calls, LLM completions and server operations.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Central metrics collection.
#[derive(Debug)]
pub struct Metrics {
    /// Tool invocations by tool name.
    tools: RwLock<HashMap<String, ToolStats>>,

    /// Named operations (`llm.chat`, `mcp.connect`, `query`, ...).
    operations: RwLock<HashMap<String, LatencyStats>>,

    /// Tool calls the model made that no server provides.
    unrouted_calls: AtomicU64,

    input_tokens: AtomicU64,
    output_tokens: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            operations: RwLock::new(HashMap::new()),
            unrouted_calls: AtomicU64::new(0),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one tool invocation.
    pub fn record_tool(&self, name: &str, duration: Duration, success: bool) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        tools.entry(name.to_string()).or_default().record(duration, success);
    }

    /// Record a tool call that could not be routed to any server.
    pub fn record_unrouted(&self) {
        self.unrouted_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a named operation.
    pub fn record_operation(&self, name: &str, duration: Duration) {
        let mut ops = self.operations.write().unwrap_or_else(PoisonError::into_inner);
        ops.entry(name.to_string()).or_default().record(duration);
    }

    /// Record token usage from one completion.
    pub fn record_tokens(&self, input: u64, output: u64) {
        self.input_tokens.fetch_add(input, Ordering::Relaxed);
        self.output_tokens.fetch_add(output, Ordering::Relaxed);
    }

    pub fn tool_stats(&self, name: &str) -> Option<ToolStats> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn operation_stats(&self, name: &str) -> Option<LatencyStats> {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Total (input, output) tokens.
    pub fn token_counts(&self) -> (u64, u64) {
        (
            self.input_tokens.load(Ordering::Relaxed),
            self.output_tokens.load(Ordering::Relaxed),
        )
    }

    /// Take a snapshot, sorted by name.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        let operations = self.operations.read().unwrap_or_else(PoisonError::into_inner);
        let (input_tokens, output_tokens) = self.token_counts();

        MetricsSnapshot {
            tools: tools.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            operations: operations.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            unrouted_calls: self.unrouted_calls.load(Ordering::Relaxed),
            input_tokens,
            output_tokens,
            uptime: self.start_time.elapsed(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.tools.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.operations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.unrouted_calls.store(0, Ordering::Relaxed);
        self.input_tokens.store(0, Ordering::Relaxed);
        self.output_tokens.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Count and latency range of a repeated operation.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    pub count: u64,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl LatencyStats {
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total += duration;
        self.min = self.min.min(duration);
        self.max = self.max.max(duration);
    }

    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count as u32
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            count: 0,
            total: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
        }
    }
}

/// Outcome counts for one tool.
#[derive(Debug, Clone, Default)]
pub struct ToolStats {
    pub latency: LatencyStats,
    pub failures: u64,
}

impl ToolStats {
    pub fn record(&mut self, duration: Duration, success: bool) {
        self.latency.record(duration);
        if !success {
            self.failures += 1;
        }
    }

    pub fn invocations(&self) -> u64 {
        self.latency.count
    }

    /// Success rate between 0.0 and 1.0. No calls counts as 1.0.
    pub fn success_rate(&self) -> f64 {
        match self.latency.count {
            0 => 1.0,
            n => (n - self.failures) as f64 / n as f64,
        }
    }
}

/// A point-in-time copy of all metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub tools: BTreeMap<String, ToolStats>,
    pub operations: BTreeMap<String, LatencyStats>,
    pub unrouted_calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::from("=== Session Stats ===\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));
        report.push_str(&format!(
            "Tokens: {} input, {} output\n",
            self.input_tokens, self.output_tokens
        ));

        if !self.tools.is_empty() || self.unrouted_calls > 0 {
            report.push_str("\nTools:\n");
            for (name, stats) in &self.tools {
                report.push_str(&format!(
                    "  {}: {} calls, {:.0}% ok, avg {:.2?}\n",
                    name,
                    stats.invocations(),
                    stats.success_rate() * 100.0,
                    stats.latency.avg()
                ));
            }
            if self.unrouted_calls > 0 {
                report.push_str(&format!("  (unrouted): {} calls\n", self.unrouted_calls));
            }
        }

        if !self.operations.is_empty() {
            report.push_str("\nOperations:\n");
            for (name, stats) in &self.operations {
                report.push_str(&format!(
                    "  {}: {} ops, avg {:.2?}, max {:.2?}\n",
                    name,
                    stats.count,
                    stats.avg(),
                    stats.max
                ));
            }
        }

        report
    }
}
