// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Observation-hook tests.  Hooks are process-wide and installed once, so
//! everything runs inside a single test body (this file is its own test
//! process, isolated from the other integration suites).

use std::sync::{Arc, Mutex};

use serde_json::json;

use reagent::{
    set_hooks, AgentConfig, FnTool, Hooks, LlmParams, RunStatus, ScriptedProvider, Session,
    SessionConfig, ToolRegistry,
};

#[tokio::test]
async fn hooks_fire_in_order_with_typed_records() {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    fn push(log: &Arc<Mutex<Vec<String>>>, entry: String) {
        log.lock().unwrap().push(entry);
    }

    let hooks = {
        let l = Arc::clone(&log);
        let run_start = Box::new(move |info: &reagent::hooks::RunStartInfo<'_>| {
            push(&l, format!("run_start:{}", info.input));
        });
        let l = Arc::clone(&log);
        let run_end = Box::new(move |info: &reagent::hooks::RunEndInfo<'_>| {
            push(&l, format!("run_end:{:?}:{}", info.status, info.iterations));
        });
        let l = Arc::clone(&log);
        let iter_start = Box::new(move |info: &reagent::hooks::IterationInfo| {
            push(&l, format!("iter_start:{}", info.iteration));
        });
        let l = Arc::clone(&log);
        let iter_end = Box::new(move |info: &reagent::hooks::IterationInfo| {
            push(&l, format!("iter_end:{}", info.iteration));
        });
        let l = Arc::clone(&log);
        let llm_request = Box::new(move |info: &reagent::hooks::LlmRequestInfo<'_>| {
            push(&l, format!("llm_request:{}", info.messages.len()));
        });
        let l = Arc::clone(&log);
        let llm_response = Box::new(move |info: &reagent::hooks::LlmResponseInfo<'_>| {
            push(&l, format!("llm_response:tools={}", info.response.has_tool_use()));
        });
        let l = Arc::clone(&log);
        let tool_start = Box::new(move |info: &reagent::hooks::ToolStartInfo<'_>| {
            push(&l, format!("tool_start:{}", info.name));
        });
        let l = Arc::clone(&log);
        let tool_end = Box::new(move |info: &reagent::hooks::ToolEndInfo<'_>| {
            push(&l, format!("tool_end:{}:success={}", info.name, info.success));
        });
        Hooks {
            on_run_start: Some(run_start),
            on_run_end: Some(run_end),
            on_iter_start: Some(iter_start),
            on_iter_end: Some(iter_end),
            on_llm_request: Some(llm_request),
            on_llm_response: Some(llm_response),
            on_tool_start: Some(tool_start),
            on_tool_end: Some(tool_end),
        }
    };
    set_hooks(hooks).unwrap();

    // A second install must be refused.
    assert!(set_hooks(Hooks::default()).is_err());

    // One tool turn whose result carries a top-level error key, then a
    // recovery answer.
    let flaky = Arc::new(
        FnTool::builder("flaky")
            .description("reports an error")
            .handler(|_args, _ctx| Ok(json!({ "error": "nope" }).to_string()))
            .build()
            .unwrap(),
    ) as Arc<dyn reagent::Tool>;

    let session = Session::open(SessionConfig::default()).unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(flaky).unwrap();
    let tools = session.add_registry(registry).await.unwrap();

    let provider = ScriptedProvider::tool_then_text("t1", "flaky", "{}", "sorry");
    let mut agent = session
        .agent_with_provider(AgentConfig::default(), LlmParams::default(), Box::new(provider))
        .await
        .unwrap();
    agent.set_tools(tools);

    let result = agent.run("try the tool").await.unwrap();
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.content.as_deref(), Some("sorry"));

    let entries = log.lock().unwrap().clone();
    assert_eq!(
        entries,
        vec![
            "run_start:try the tool",
            "iter_start:1",
            "llm_request:1",
            "llm_response:tools=true",
            "tool_start:flaky",
            // The error observation classifies as a failed tool call.
            "tool_end:flaky:success=false",
            "iter_end:1",
            "iter_start:2",
            "llm_request:3",
            "llm_response:tools=false",
            "iter_end:2",
            "run_end:Success:2",
        ]
    );
}
