// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for input parsing and capability routing.
//!
//! These benchmarks measure:
//! - Command parsing, including prompt argument tokenizing
//! - Registry lookup with many servers registered
//! - Server list parsing

use std::hint::black_box;
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{Map, Value};

use papertrail::commands::parse_command;
use papertrail::mcp::{
    CallToolResult, CapabilityRegistry, GetPromptResult, McpConfig, McpConnection, McpError,
    McpPromptInfo, McpResourceInfo, McpToolInfo, ReadResourceResult,
};

/// Connection that is never called; lookups only need the handle.
struct Idle;

#[async_trait]
impl McpConnection for Idle {
    fn is_alive(&self) -> bool {
        true
    }

    async fn list_tools(&self) -> Result<Vec<McpToolInfo>, McpError> {
        Ok(Vec::new())
    }

    async fn list_prompts(&self) -> Result<Vec<McpPromptInfo>, McpError> {
        Ok(Vec::new())
    }

    async fn list_resources(&self) -> Result<Vec<McpResourceInfo>, McpError> {
        Ok(Vec::new())
    }

    async fn call_tool(&self, _name: &str, _arguments: Value) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::default())
    }

    async fn get_prompt(
        &self,
        _name: &str,
        _arguments: Map<String, Value>,
    ) -> Result<GetPromptResult, McpError> {
        Ok(GetPromptResult::default())
    }

    async fn read_resource(&self, _uri: &str) -> Result<ReadResourceResult, McpError> {
        Ok(ReadResourceResult::default())
    }

    async fn close(&self) {}
}

fn bench_parse_command(c: &mut Criterion) {
    c.bench_function("parse_query", |b| {
        b.iter(|| parse_command(black_box("find recent papers on soil microbiomes")));
    });

    c.bench_function("parse_resource", |b| {
        b.iter(|| parse_command(black_box("@machine_learning")));
    });

    c.bench_function("parse_prompt_with_args", |b| {
        b.iter(|| {
            parse_command(black_box(
                "/prompt generate_search_prompt topic='quantum error correction' num_papers=10",
            ))
        });
    });
}

fn bench_registry_lookup(c: &mut Criterion) {
    let connection: Arc<dyn McpConnection> = Arc::new(Idle);
    let mut registry = CapabilityRegistry::new();
    for server in 0..8 {
        let name = format!("server-{}", server);
        for tool in 0..25 {
            registry.register_tool(
                &name,
                McpToolInfo::new(format!("tool_{}_{}", server, tool), "bench tool"),
                Arc::clone(&connection),
            );
        }
        registry.register_resource(
            &name,
            McpResourceInfo::new(format!("papers://topic-{}", server)),
            Arc::clone(&connection),
        );
    }

    c.bench_function("registry_lookup_hit", |b| {
        b.iter(|| registry.lookup(black_box("tool_7_24")).is_some());
    });

    c.bench_function("registry_lookup_miss", |b| {
        b.iter(|| registry.lookup(black_box("papers://quantum")).is_some());
    });

    c.bench_function("registry_tool_definitions", |b| {
        b.iter(|| registry.tool_definitions().len());
    });
}

fn bench_server_config(c: &mut Criterion) {
    let json = r#"
    {
        "mcpServers": {
            "research": {
                "command": "uv",
                "args": ["run", "research_server.py"]
            },
            "filesystem": {
                "command": "npx",
                "args": ["-y", "@modelcontextprotocol/server-filesystem", "."]
            },
            "fetch": {
                "command": "uvx",
                "args": ["mcp-server-fetch"]
            }
        }
    }
    "#;

    c.bench_function("server_config_parse", |b| {
        b.iter(|| McpConfig::from_json(black_box(json)).map(|c| c.len()));
    });
}

criterion_group!(
    benches,
    bench_parse_command,
    bench_registry_lookup,
    bench_server_config
);
criterion_main!(benches);
