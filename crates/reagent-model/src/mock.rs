// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use std::sync::Mutex;

use async_trait::async_trait;

use reagent_core::Result;

use crate::{
    assemble, stream_abort_error, BlockKind, Capabilities, ChatRequest, ChatResponse,
    DeltaKind, Provider, StopReason, StreamEvent, StreamHandler, Usage,
};

/// Deterministic mock provider for tests.  Echoes the last user message back
/// as the assistant response.
#[derive(Default)]
pub struct MockProvider;

fn mock_caps() -> Capabilities {
    Capabilities::THINKING
        | Capabilities::REASONING
        | Capabilities::STREAMING
        | Capabilities::TOOLS
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model(&self) -> &str {
        "mock-model"
    }
    fn capabilities(&self) -> Capabilities {
        mock_caps()
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        assemble(&echo_script(&req))
    }

    async fn chat_stream(
        &self,
        req: ChatRequest,
        on_event: &mut StreamHandler<'_>,
    ) -> Result<ChatResponse> {
        let events = echo_script(&req);
        for ev in &events {
            if on_event(ev).is_break() {
                return Err(stream_abort_error());
            }
        }
        assemble(&events)
    }
}

fn echo_script(req: &ChatRequest) -> Vec<StreamEvent> {
    let reply = req
        .messages
        .iter()
        .rev()
        .find(|m| m.role == crate::Role::User)
        .and_then(|m| m.as_text())
        .unwrap_or("[no input]");
    text_script(&format!("MOCK: {reply}"))
}

/// A pre-scripted provider.  Each call pops the next event script from the
/// front of the queue, so tests can specify exact sequences — including tool
/// calls and malformed streams — without network access.
pub struct ScriptedProvider {
    scripts: Mutex<Vec<Vec<StreamEvent>>>,
    /// Replayed once the queue is exhausted; used for "provider always
    /// answers the same way" scenarios such as iteration-cap tests.
    fallback: Option<Vec<StreamEvent>>,
    /// The last request seen, so tests can inspect what was sent.
    pub last_request: Mutex<Option<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Vec<StreamEvent>>) -> Self {
        Self { scripts: Mutex::new(scripts), fallback: None, last_request: Mutex::new(None) }
    }

    /// Provider that replays the same script on every call.
    pub fn looping(script: Vec<StreamEvent>) -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            fallback: Some(script),
            last_request: Mutex::new(None),
        }
    }

    /// Convenience: one call answering with a single text reply.
    pub fn text(reply: impl Into<String>) -> Self {
        Self::new(vec![text_script(&reply.into())])
    }

    /// Convenience: a tool call on the first turn, text on the second.
    pub fn tool_then_text(
        tool_id: impl Into<String>,
        tool_name: impl Into<String>,
        args_json: impl Into<String>,
        final_text: impl Into<String>,
    ) -> Self {
        Self::new(vec![
            tool_script(tool_id, tool_name, args_json),
            text_script(&final_text.into()),
        ])
    }

    /// Convenience: every call requests the same tool.
    pub fn always_tool(
        tool_id: impl Into<String>,
        tool_name: impl Into<String>,
        args_json: impl Into<String>,
    ) -> Self {
        Self::looping(tool_script(tool_id, tool_name, args_json))
    }

    fn next_script(&self, req: ChatRequest) -> Vec<StreamEvent> {
        *self.last_request.lock().unwrap_or_else(|p| p.into_inner()) = Some(req);
        let mut scripts = self.scripts.lock().unwrap_or_else(|p| p.into_inner());
        if scripts.is_empty() {
            match &self.fallback {
                Some(script) => script.clone(),
                None => text_script("[no more scripts]"),
            }
        } else {
            scripts.remove(0)
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model(&self) -> &str {
        "scripted-mock-model"
    }
    fn capabilities(&self) -> Capabilities {
        mock_caps()
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        assemble(&self.next_script(req))
    }

    async fn chat_stream(
        &self,
        req: ChatRequest,
        on_event: &mut StreamHandler<'_>,
    ) -> Result<ChatResponse> {
        let events = self.next_script(req);
        for ev in &events {
            if on_event(ev).is_break() {
                return Err(stream_abort_error());
            }
        }
        assemble(&events)
    }
}

// ─── Script builders ──────────────────────────────────────────────────────────

/// Event sequence for a plain text reply.
pub fn text_script(text: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::MessageStart { id: None },
        StreamEvent::ContentBlockStart {
            index: 0,
            kind: BlockKind::Text,
            tool_id: None,
            tool_name: None,
        },
        StreamEvent::Delta { index: 0, kind: DeltaKind::Text, data: text.to_string() },
        StreamEvent::ContentBlockStop { index: 0, kind: BlockKind::Text },
        StreamEvent::MessageDelta {
            stop_reason: Some(StopReason::EndTurn),
            usage: Some(Usage { input: 5, output: 1, ..Default::default() }),
        },
        StreamEvent::MessageStop,
    ]
}

/// Event sequence for a single tool-call turn.
pub fn tool_script(
    id: impl Into<String>,
    name: impl Into<String>,
    args_json: impl Into<String>,
) -> Vec<StreamEvent> {
    vec![
        StreamEvent::MessageStart { id: None },
        StreamEvent::ContentBlockStart {
            index: 0,
            kind: BlockKind::ToolUse,
            tool_id: Some(id.into()),
            tool_name: Some(name.into()),
        },
        StreamEvent::Delta { index: 0, kind: DeltaKind::InputJson, data: args_json.into() },
        StreamEvent::ContentBlockStop { index: 0, kind: BlockKind::ToolUse },
        StreamEvent::MessageDelta {
            stop_reason: Some(StopReason::ToolUse),
            usage: Some(Usage { input: 5, output: 2, ..Default::default() }),
        },
        StreamEvent::MessageStop,
    ]
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use super::*;
    use crate::Message;

    fn req(text: &str) -> ChatRequest {
        ChatRequest { messages: vec![Message::user(text)], tools: None, ..Default::default() }
    }

    #[tokio::test]
    async fn mock_echoes_last_user_message() {
        let resp = MockProvider.chat(req("hi")).await.unwrap();
        assert_eq!(resp.text(), "MOCK: hi");
        assert_eq!(resp.stop_reason, Some(StopReason::EndTurn));
    }

    #[tokio::test]
    async fn scripted_single_text_reply() {
        let p = ScriptedProvider::text("hello world");
        let resp = p.chat(req("x")).await.unwrap();
        assert_eq!(resp.text(), "hello world");
    }

    #[tokio::test]
    async fn scripted_records_last_request() {
        let p = ScriptedProvider::text("y");
        p.chat(req("inspect me")).await.unwrap();
        let seen = p.last_request.lock().unwrap();
        assert_eq!(seen.as_ref().unwrap().messages[0].as_text(), Some("inspect me"));
    }

    #[tokio::test]
    async fn scripted_tool_then_text() {
        let p = ScriptedProvider::tool_then_text("t1", "calc", r#"{"a":1}"#, "done");
        let first = p.chat(req("go")).await.unwrap();
        assert_eq!(first.tool_uses(), vec![("t1", "calc", r#"{"a":1}"#)]);
        let second = p.chat(req("observed")).await.unwrap();
        assert_eq!(second.text(), "done");
    }

    #[tokio::test]
    async fn looping_provider_repeats_script() {
        let p = ScriptedProvider::always_tool("t", "noop", "{}");
        for _ in 0..3 {
            let resp = p.chat(req("again")).await.unwrap();
            assert!(resp.has_tool_use());
        }
    }

    #[tokio::test]
    async fn exhausted_scripts_fall_back_to_marker_text() {
        let p = ScriptedProvider::new(vec![]);
        let resp = p.chat(req("x")).await.unwrap();
        assert!(resp.text().contains("no more scripts"));
    }

    #[tokio::test]
    async fn stream_delivers_events_then_response() {
        let p = ScriptedProvider::text("streamed");
        let mut kinds = Vec::new();
        let resp = p
            .chat_stream(req("x"), &mut |ev| {
                kinds.push(std::mem::discriminant(ev));
                ControlFlow::Continue(())
            })
            .await
            .unwrap();
        assert_eq!(kinds.len(), 6);
        assert_eq!(resp.text(), "streamed");
    }

    #[tokio::test]
    async fn stream_abort_stops_delivery() {
        let p = ScriptedProvider::text("never seen");
        let mut count = 0;
        let err = p
            .chat_stream(req("x"), &mut |_| {
                count += 1;
                ControlFlow::Break(())
            })
            .await
            .unwrap_err();
        assert_eq!(count, 1);
        assert!(err.to_string().contains("aborted"));
    }
}
