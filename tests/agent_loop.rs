// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end tests of the conversation loop against in-process servers.

mod common;

use std::sync::Arc;

use papertrail::agent::{MAX_ITERATIONS_REACHED, NO_RESPONSE};
use papertrail::mcp::ConnectionManager;
use papertrail::types::{ProviderResponse, Role, ToolCall};

use common::{agent, FakeServer, ScriptedProvider, ToolBehavior};

async fn research_manager(server: FakeServer) -> (ConnectionManager, Arc<FakeServer>) {
    let server = Arc::new(server);
    let mut manager = ConnectionManager::new();
    manager.discover("research", server.clone()).await;
    (manager, server)
}

fn call(id: &str, name: &str, args: &str) -> ToolCall {
    ToolCall::new(id, name, args)
}

#[tokio::test]
async fn test_final_answer_takes_one_call() {
    let (manager, server) = research_manager(
        FakeServer::new().tool("search_papers", ToolBehavior::Reply("[]".into())),
    )
    .await;
    let provider = Arc::new(ScriptedProvider::new(vec![ProviderResponse::text(
        "Hello! Ask me about papers.",
    )]));

    let answer = agent(manager.snapshot(), provider.clone())
        .process_query("hi")
        .await
        .unwrap();

    assert_eq!(answer, "Hello! Ask me about papers.");
    assert_eq!(provider.call_count(), 1);
    assert_eq!(*provider.tools_seen.lock().unwrap(), vec![1]);
    assert!(server.calls().is_empty());
}

#[tokio::test]
async fn test_search_then_answer() {
    let (manager, server) = research_manager(
        FakeServer::new().tool(
            "search_papers",
            ToolBehavior::Reply("[\"2401.00001\", \"2401.00002\"]".into()),
        ),
    )
    .await;
    let provider = Arc::new(ScriptedProvider::new(vec![
        ProviderResponse::tool_calls(vec![call(
            "call_1",
            "search_papers",
            r#"{"topic": "rust", "max_results": 2}"#,
        )]),
        ProviderResponse::text("Found two papers on rust."),
    ]));

    let answer = agent(manager.snapshot(), provider.clone())
        .process_query("find 2 papers on rust")
        .await
        .unwrap();

    assert_eq!(answer, "Found two papers on rust.");
    assert_eq!(
        server.calls(),
        vec![r#"tool:search_papers:{"topic":"rust","max_results":2}"#]
    );

    let conversation = provider.last_conversation();
    let roles: Vec<Role> = conversation.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
    assert_eq!(
        conversation[2].text(),
        Some("[\"2401.00001\", \"2401.00002\"]")
    );
}

#[tokio::test]
async fn test_tool_failure_does_not_end_the_query() {
    let (manager, _server) = research_manager(
        FakeServer::new()
            .tool("extract_info", ToolBehavior::Fail("paper not indexed".into()))
            .tool("search_papers", ToolBehavior::Reply("[\"2401.00001\"]".into())),
    )
    .await;
    let provider = Arc::new(ScriptedProvider::new(vec![
        ProviderResponse::tool_calls(vec![call("a", "extract_info", r#"{"paper_id":"x"}"#)]),
        ProviderResponse::tool_calls(vec![call("b", "search_papers", r#"{"topic":"x"}"#)]),
        ProviderResponse::text("Recovered."),
    ]));

    let answer = agent(manager.snapshot(), provider.clone())
        .process_query("tell me about x")
        .await
        .unwrap();

    assert_eq!(answer, "Recovered.");
    let conversation = provider.last_conversation();
    let error = conversation[2].text().unwrap();
    assert!(error.starts_with("Error calling tool: "), "got {}", error);
    assert!(error.contains("paper not indexed"));
    assert_eq!(conversation[4].text(), Some("[\"2401.00001\"]"));
}

#[tokio::test]
async fn test_flagged_result_is_reported_as_error() {
    let (manager, _server) = research_manager(
        FakeServer::new().tool("search_papers", ToolBehavior::Flagged("arXiv unavailable".into())),
    )
    .await;
    let provider = Arc::new(ScriptedProvider::new(vec![
        ProviderResponse::tool_calls(vec![call("a", "search_papers", "{}")]),
        ProviderResponse::text("Sorry."),
    ]));

    agent(manager.snapshot(), provider.clone())
        .process_query("search")
        .await
        .unwrap();

    assert_eq!(
        provider.last_conversation()[2].text(),
        Some("Error calling tool: arXiv unavailable")
    );
}

#[tokio::test]
async fn test_iteration_budget_is_exactly_ten_calls() {
    let (manager, server) = research_manager(
        FakeServer::new().tool("search_papers", ToolBehavior::Reply("[]".into())),
    )
    .await;
    let provider = Arc::new(ScriptedProvider::repeating(ProviderResponse::tool_calls(
        vec![call("loop", "search_papers", r#"{"topic":"again"}"#)],
    )));

    let answer = agent(manager.snapshot(), provider.clone())
        .process_query("never stop")
        .await
        .unwrap();

    assert_eq!(answer, MAX_ITERATIONS_REACHED);
    assert_eq!(provider.call_count(), 10);
    assert_eq!(server.calls().len(), 10);
}

#[tokio::test]
async fn test_empty_final_answer_gets_placeholder() {
    let (manager, _server) = research_manager(FakeServer::new()).await;
    let provider = Arc::new(ScriptedProvider::new(vec![ProviderResponse::empty()]));

    let answer = agent(manager.snapshot(), provider.clone())
        .process_query("hello?")
        .await
        .unwrap();

    assert_eq!(answer, NO_RESPONSE);
    assert_eq!(*provider.tools_seen.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn test_queries_do_not_share_history() {
    let (manager, _server) = research_manager(FakeServer::new()).await;
    let provider = Arc::new(ScriptedProvider::new(vec![
        ProviderResponse::text("first"),
        ProviderResponse::text("second"),
    ]));
    let agent = agent(manager.snapshot(), provider.clone());

    agent.process_query("one").await.unwrap();
    agent.process_query("two").await.unwrap();

    let conversation = provider.last_conversation();
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation[0].text(), Some("two"));
}
