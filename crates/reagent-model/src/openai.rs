// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Driver for the chat-completions wire format spoken by OpenAI and the many
//! compatible servers (local runtimes, gateways, regional providers).
//!
//! Streaming here is coarser than the uniform event model: the server emits
//! `choices[0].delta` fragments with no block boundaries, so the normalizer
//! synthesizes `ContentBlockStart`/`Stop` events from field transitions.

use std::ops::ControlFlow;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::debug;

use reagent_config::{LlmParams, StatefulConfig};
use reagent_core::{Error, Result};

use crate::{
    map_transport_error, stream_abort_error, BlockKind, Capabilities, ChatRequest, ChatResponse,
    ContentBlock, DeltaKind, Message, Provider, ResponseAssembler, Role, SseDecoder, StopReason,
    StreamEvent, StreamHandler, Usage,
};

pub struct OpenAiProvider {
    model: String,
    api_key: Option<String>,
    chat_url: String,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<u32>,
    stateful: StatefulConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(params: &LlmParams, api_key: Option<String>) -> Result<Self> {
        let base = params
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1")
            .trim_end_matches('/');
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(params.timeout_ms))
            .build()
            .map_err(|e| Error::Backend(e.to_string()))?;
        Ok(Self {
            model: params.model.clone(),
            api_key,
            chat_url: format!("{base}/chat/completions"),
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stateful: params.stateful.clone(),
            client,
        })
    }

    fn build_body(&self, req: &ChatRequest, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": build_openai_messages(&req.messages),
            "stream": stream,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(p) = self.top_p {
            body["top_p"] = json!(p);
        }
        if let Some(m) = self.max_tokens {
            body["max_tokens"] = json!(m);
        }
        if let Some(tools) = &req.tools {
            if tools.as_array().is_some_and(|a| !a.is_empty()) {
                body["tools"] = tools.clone();
                body["tool_choice"] = json!("auto");
            }
        }
        if self.stateful.store {
            body["store"] = json!(true);
        }
        if stream {
            body["stream_options"] = json!({ "include_usage": true });
        }
        body
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        debug!(
            model = %self.model,
            url = %self.chat_url,
            "sending chat completion request"
        );
        let mut http_req = self.client.post(&self.chat_url).json(body);
        if let Some(key) = &self.api_key {
            http_req = http_req.bearer_auth(key);
        }
        let resp = http_req.send().await.map_err(map_transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http { status: status.as_u16(), body });
        }
        Ok(resp)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::REASONING
            | Capabilities::STREAMING
            | Capabilities::TOOLS
            | Capabilities::STATEFUL
            | Capabilities::VISION
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(&req, false);
        let resp = self.send(&body).await?;
        let v: Value = resp.json().await.map_err(|e| Error::Parse(e.to_string()))?;
        parse_chat_completion(&v)
    }

    async fn chat_stream(
        &self,
        req: ChatRequest,
        on_event: &mut StreamHandler<'_>,
    ) -> Result<ChatResponse> {
        let body = self.build_body(&req, true);
        let resp = self.send(&body).await?;

        let mut byte_stream = resp.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut norm = OpenAiStream::default();
        let mut asm = ResponseAssembler::new();
        let mut aborted = false;
        let mut apply_err: Option<Error> = None;

        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(map_transport_error)?;
            decoder.feed(&chunk, &mut |rec| {
                let mut events = Vec::new();
                if rec.data == "[DONE]" {
                    norm.on_done(&mut events);
                } else if let Ok(v) = serde_json::from_str::<Value>(&rec.data) {
                    norm.on_chunk(&v, &mut events);
                }
                for ev in &events {
                    if let Err(e) = asm.apply(ev) {
                        apply_err = Some(e);
                        return ControlFlow::Break(());
                    }
                    if on_event(ev).is_break() {
                        aborted = true;
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            })?;
            if aborted {
                return Err(stream_abort_error());
            }
            if let Some(e) = apply_err.take() {
                return Err(e);
            }
            if asm.is_finished() {
                break;
            }
        }
        asm.finish()
    }
}

// ─── Request serialization ────────────────────────────────────────────────────

/// Convert transcript messages into the chat-completions `messages` array.
///
/// Assistant messages carrying tool calls serialize their calls into a
/// `tool_calls` array with `content` explicitly `null` when no text is
/// present.  Tool messages carry `tool_call_id`.  System messages stay
/// in-band.  Thinking/reasoning blocks have no slot in this wire format and
/// are omitted.
pub(crate) fn build_openai_messages(messages: &[Message]) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len());
    for m in messages {
        match m.role {
            Role::Tool => {
                for block in &m.blocks {
                    if let ContentBlock::ToolResult { tool_use_id, content, .. } = block {
                        out.push(json!({
                            "role": "tool",
                            "tool_call_id": tool_use_id,
                            "content": content,
                        }));
                    }
                }
            }
            Role::Assistant if m.has_tool_use() => {
                let text = m.joined_text();
                let calls: Vec<Value> = m
                    .blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolUse { id, name, input } => Some(json!({
                            "id": id,
                            "type": "function",
                            "function": { "name": name, "arguments": input },
                        })),
                        _ => None,
                    })
                    .collect();
                out.push(json!({
                    "role": "assistant",
                    "content": if text.is_empty() { Value::Null } else { json!(text) },
                    "tool_calls": calls,
                }));
            }
            _ => {
                out.push(json!({
                    "role": m.role.as_str(),
                    "content": m.joined_text(),
                }));
            }
        }
    }
    out
}

// ─── Response parsing ─────────────────────────────────────────────────────────

/// Parse a non-streaming chat-completion body into a [`ChatResponse`].
pub(crate) fn parse_chat_completion(v: &Value) -> Result<ChatResponse> {
    let choice = v["choices"]
        .get(0)
        .ok_or_else(|| Error::Parse("chat completion has no choices".into()))?;
    let msg = &choice["message"];

    let mut blocks = Vec::new();
    if let Some(r) = msg.get("reasoning_content").and_then(|c| c.as_str()) {
        if !r.is_empty() {
            blocks.push(ContentBlock::Reasoning { text: r.to_string() });
        }
    }
    if let Some(t) = msg["content"].as_str() {
        if !t.is_empty() {
            blocks.push(ContentBlock::text(t));
        }
    }
    if let Some(calls) = msg["tool_calls"].as_array() {
        for tc in calls {
            blocks.push(ContentBlock::ToolUse {
                id: tc["id"].as_str().unwrap_or("").to_string(),
                name: tc["function"]["name"].as_str().unwrap_or("").to_string(),
                input: tc["function"]["arguments"].as_str().unwrap_or("{}").to_string(),
            });
        }
    }

    let has_tool_use = blocks.iter().any(ContentBlock::is_tool_use);
    let stop_reason = match choice["finish_reason"].as_str() {
        Some(fr) => Some(StopReason::from_openai(fr)),
        None if has_tool_use => Some(StopReason::ToolUse),
        None => None,
    };

    Ok(ChatResponse {
        id: v["id"].as_str().map(str::to_string),
        blocks,
        stop_reason,
        usage: v.get("usage").map(parse_openai_usage).unwrap_or_default(),
    })
}

fn parse_openai_usage(u: &Value) -> Usage {
    Usage {
        input: u["prompt_tokens"].as_u64().unwrap_or(0),
        output: u["completion_tokens"].as_u64().unwrap_or(0),
        thinking: 0,
        reasoning: u["completion_tokens_details"]["reasoning_tokens"].as_u64().unwrap_or(0),
        cache_create: 0,
        cache_read: u["prompt_tokens_details"]["cached_tokens"].as_u64().unwrap_or(0),
    }
}

// ─── Stream normalization ─────────────────────────────────────────────────────

/// Synthesizes uniform block-bracketed events from `choices[0].delta`
/// fragments by tracking field transitions: the first `reasoning_content`
/// opens a reasoning block, the first `content` opens a text block (closing
/// the reasoning block), each `tool_calls[n].id` opens a tool-use block, and
/// `finish_reason` / `[DONE]` close whatever is open.
#[derive(Debug, Default)]
pub(crate) struct OpenAiStream {
    started: bool,
    next_index: u32,
    open: Option<(u32, BlockKind)>,
    /// Provider-side index of the tool call the open block belongs to.
    current_tool: Option<u32>,
}

impl OpenAiStream {
    pub(crate) fn on_chunk(&mut self, v: &Value, out: &mut Vec<StreamEvent>) {
        if !self.started {
            self.started = true;
            out.push(StreamEvent::MessageStart { id: v["id"].as_str().map(str::to_string) });
        }

        if let Some(usage) = v.get("usage").filter(|u| !u.is_null()) {
            out.push(StreamEvent::MessageDelta {
                stop_reason: None,
                usage: Some(parse_openai_usage(usage)),
            });
        }

        let Some(choice) = v["choices"].get(0) else { return };
        let delta = &choice["delta"];

        if let Some(calls) = delta.get("tool_calls").and_then(|t| t.as_array()) {
            for tc in calls {
                let provider_idx = tc["index"].as_u64().unwrap_or(0) as u32;
                let index = match self.open {
                    Some((i, BlockKind::ToolUse)) if self.current_tool == Some(provider_idx) => i,
                    _ => {
                        self.close_open(out);
                        let index = self.next_index;
                        self.next_index += 1;
                        out.push(StreamEvent::ContentBlockStart {
                            index,
                            kind: BlockKind::ToolUse,
                            tool_id: tc["id"].as_str().map(str::to_string),
                            tool_name: tc["function"]["name"].as_str().map(str::to_string),
                        });
                        self.open = Some((index, BlockKind::ToolUse));
                        self.current_tool = Some(provider_idx);
                        index
                    }
                };
                let args = tc["function"]["arguments"].as_str().unwrap_or("");
                if !args.is_empty() {
                    out.push(StreamEvent::Delta {
                        index,
                        kind: DeltaKind::InputJson,
                        data: args.to_string(),
                    });
                }
            }
        }

        // Two field names carry chain-of-thought text: `reasoning_content`
        // (llama.cpp, DeepSeek, Qwen) and `reasoning` (gateway dialect).
        let reasoning = delta
            .get("reasoning_content")
            .and_then(|c| c.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| delta.get("reasoning").and_then(|c| c.as_str()).filter(|s| !s.is_empty()));
        if let Some(r) = reasoning {
            let index = self.ensure_block(BlockKind::Reasoning, out);
            out.push(StreamEvent::Delta {
                index,
                kind: DeltaKind::Reasoning,
                data: r.to_string(),
            });
        }

        if let Some(t) = delta.get("content").and_then(|c| c.as_str()) {
            if !t.is_empty() {
                let index = self.ensure_block(BlockKind::Text, out);
                out.push(StreamEvent::Delta {
                    index,
                    kind: DeltaKind::Text,
                    data: t.to_string(),
                });
            }
        }

        if let Some(fr) = choice["finish_reason"].as_str() {
            self.close_open(out);
            out.push(StreamEvent::MessageDelta {
                stop_reason: Some(StopReason::from_openai(fr)),
                usage: None,
            });
        }
    }

    /// The terminal `data: [DONE]` sentinel.
    pub(crate) fn on_done(&mut self, out: &mut Vec<StreamEvent>) {
        if !self.started {
            // Degenerate stream with no content chunks at all.
            self.started = true;
            out.push(StreamEvent::MessageStart { id: None });
        }
        self.close_open(out);
        out.push(StreamEvent::MessageStop);
    }

    fn ensure_block(&mut self, kind: BlockKind, out: &mut Vec<StreamEvent>) -> u32 {
        if let Some((index, open_kind)) = self.open {
            if open_kind == kind {
                return index;
            }
        }
        self.close_open(out);
        let index = self.next_index;
        self.next_index += 1;
        out.push(StreamEvent::ContentBlockStart { index, kind, tool_id: None, tool_name: None });
        self.open = Some((index, kind));
        index
    }

    fn close_open(&mut self, out: &mut Vec<StreamEvent>) {
        if let Some((index, kind)) = self.open.take() {
            out.push(StreamEvent::ContentBlockStop { index, kind });
        }
        self.current_tool = None;
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;

    // ── Message serialization ────────────────────────────────────────────────

    #[test]
    fn system_messages_stay_in_band() {
        let msgs =
            vec![Message::system("be helpful"), Message::user("hi")];
        let wire = build_openai_messages(&msgs);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[0]["content"], "be helpful");
        assert_eq!(wire[1]["role"], "user");
    }

    #[test]
    fn assistant_tool_calls_emit_null_content() {
        let msg = Message {
            role: Role::Assistant,
            blocks: vec![ContentBlock::ToolUse {
                id: "call_1".into(),
                name: "shell".into(),
                input: r#"{"command":"ls"}"#.into(),
            }],
        };
        let wire = build_openai_messages(&[msg]);
        assert!(wire[0]["content"].is_null(), "content must be explicit null");
        let calls = wire[0]["tool_calls"].as_array().unwrap();
        assert_eq!(calls[0]["id"], "call_1");
        assert_eq!(calls[0]["type"], "function");
        assert_eq!(calls[0]["function"]["name"], "shell");
        assert_eq!(calls[0]["function"]["arguments"], r#"{"command":"ls"}"#);
    }

    #[test]
    fn assistant_text_plus_tool_calls_keeps_text() {
        let msg = Message {
            role: Role::Assistant,
            blocks: vec![
                ContentBlock::text("let me check"),
                ContentBlock::ToolUse { id: "c".into(), name: "t".into(), input: "{}".into() },
            ],
        };
        let wire = build_openai_messages(&[msg]);
        assert_eq!(wire[0]["content"], "let me check");
        assert_eq!(wire[0]["tool_calls"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn tool_message_carries_tool_call_id() {
        let wire = build_openai_messages(&[Message::tool_result("t1", r#"{"result":5}"#, false)]);
        assert_eq!(wire[0]["role"], "tool");
        assert_eq!(wire[0]["tool_call_id"], "t1");
        assert_eq!(wire[0]["content"], r#"{"result":5}"#);
    }

    #[test]
    fn thinking_blocks_have_no_wire_slot() {
        let msg = Message {
            role: Role::Assistant,
            blocks: vec![
                ContentBlock::Thinking { text: "hmm".into(), signature: Some("s".into()) },
                ContentBlock::text("answer"),
            ],
        };
        let wire = build_openai_messages(&[msg]);
        assert_eq!(wire[0]["content"], "answer");
        assert!(wire[0].get("tool_calls").is_none());
    }

    // ── Response parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_simple_text_completion() {
        let v: Value = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"hi","tool_calls":null},
                "finish_reason":"stop"}],
                "usage":{"prompt_tokens":5,"completion_tokens":1,"total_tokens":6}}"#,
        )
        .unwrap();
        let resp = parse_chat_completion(&v).unwrap();
        assert_eq!(resp.text(), "hi");
        assert_eq!(resp.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(resp.usage.input, 5);
        assert_eq!(resp.usage.output, 1);
    }

    #[test]
    fn parse_tool_call_completion() {
        let v = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "t1",
                        "function": { "name": "calculator",
                                      "arguments": "{\"operation\":\"add\",\"a\":2,\"b\":3}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let resp = parse_chat_completion(&v).unwrap();
        let uses = resp.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].0, "t1");
        assert_eq!(uses[0].1, "calculator");
        assert_eq!(resp.stop_reason, Some(StopReason::ToolUse));
    }

    #[test]
    fn parse_missing_choices_is_parse_error() {
        let v = json!({ "object": "error" });
        assert!(parse_chat_completion(&v).is_err());
    }

    #[test]
    fn parse_usage_with_cached_tokens() {
        let v = json!({
            "choices": [{ "message": { "content": "x" }, "finish_reason": "stop" }],
            "usage": {
                "prompt_tokens": 200,
                "completion_tokens": 40,
                "prompt_tokens_details": { "cached_tokens": 150 }
            }
        });
        let resp = parse_chat_completion(&v).unwrap();
        assert_eq!(resp.usage.cache_read, 150);
    }

    #[test]
    fn parse_reasoning_content_field() {
        let v = json!({
            "choices": [{
                "message": { "content": "42", "reasoning_content": "thinking it over" },
                "finish_reason": "stop"
            }]
        });
        let resp = parse_chat_completion(&v).unwrap();
        assert_eq!(
            resp.blocks[0],
            ContentBlock::Reasoning { text: "thinking it over".into() }
        );
        assert_eq!(resp.blocks[1], ContentBlock::text("42"));
    }

    // ── Stream normalization ─────────────────────────────────────────────────

    fn run_chunks(chunks: &[Value], done: bool) -> Vec<StreamEvent> {
        let mut norm = OpenAiStream::default();
        let mut out = Vec::new();
        for c in chunks {
            norm.on_chunk(c, &mut out);
        }
        if done {
            norm.on_done(&mut out);
        }
        out
    }

    #[test]
    fn text_stream_synthesizes_block_boundaries() {
        let events = run_chunks(
            &[
                json!({ "id": "c1", "choices": [{ "delta": { "content": "hel" } }] }),
                json!({ "choices": [{ "delta": { "content": "lo" } }] }),
                json!({ "choices": [{ "delta": {}, "finish_reason": "stop" }] }),
            ],
            true,
        );
        let resp = assemble(&events).unwrap();
        assert_eq!(resp.text(), "hello");
        assert_eq!(resp.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(resp.id.as_deref(), Some("c1"));
    }

    #[test]
    fn reasoning_block_precedes_text_block() {
        let events = run_chunks(
            &[
                json!({ "choices": [{ "delta": { "reasoning_content": "step 1" } }] }),
                json!({ "choices": [{ "delta": { "content": "answer" } }] }),
                json!({ "choices": [{ "delta": {}, "finish_reason": "stop" }] }),
            ],
            true,
        );
        // Reasoning block must close before the text block opens.
        let starts: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::ContentBlockStart { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(starts, vec![BlockKind::Reasoning, BlockKind::Text]);
        let resp = assemble(&events).unwrap();
        assert_eq!(resp.blocks[0], ContentBlock::Reasoning { text: "step 1".into() });
        assert_eq!(resp.blocks[1], ContentBlock::text("answer"));
    }

    #[test]
    fn tool_call_stream_accumulates_arguments() {
        let events = run_chunks(
            &[
                json!({ "choices": [{ "delta": { "tool_calls": [{
                    "index": 0, "id": "call_1",
                    "function": { "name": "grep", "arguments": "" }
                }] } }] }),
                json!({ "choices": [{ "delta": { "tool_calls": [{
                    "index": 0, "function": { "arguments": "{\"pattern\":" }
                }] } }] }),
                json!({ "choices": [{ "delta": { "tool_calls": [{
                    "index": 0, "function": { "arguments": "\"x\"}" }
                }] } }] }),
                json!({ "choices": [{ "delta": {}, "finish_reason": "tool_calls" }] }),
            ],
            true,
        );
        let resp = assemble(&events).unwrap();
        let uses = resp.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].0, "call_1");
        assert_eq!(uses[0].1, "grep");
        assert_eq!(uses[0].2, r#"{"pattern":"x"}"#);
        assert_eq!(resp.stop_reason, Some(StopReason::ToolUse));
    }

    #[test]
    fn parallel_tool_calls_get_separate_blocks() {
        let events = run_chunks(
            &[
                json!({ "choices": [{ "delta": { "tool_calls": [{
                    "index": 0, "id": "c0",
                    "function": { "name": "glob", "arguments": "{}" }
                }] } }] }),
                json!({ "choices": [{ "delta": { "tool_calls": [{
                    "index": 1, "id": "c1",
                    "function": { "name": "grep", "arguments": "{}" }
                }] } }] }),
                json!({ "choices": [{ "delta": {}, "finish_reason": "tool_calls" }] }),
            ],
            true,
        );
        let resp = assemble(&events).unwrap();
        let uses = resp.tool_uses();
        assert_eq!(uses.len(), 2);
        assert_eq!(uses[0].1, "glob");
        assert_eq!(uses[1].1, "grep");
    }

    #[test]
    fn usage_chunk_reaches_final_response() {
        let events = run_chunks(
            &[
                json!({ "choices": [{ "delta": { "content": "x" } }] }),
                json!({ "choices": [{ "delta": {}, "finish_reason": "stop" }] }),
                json!({ "choices": [], "usage": { "prompt_tokens": 9, "completion_tokens": 4 } }),
            ],
            true,
        );
        let resp = assemble(&events).unwrap();
        assert_eq!(resp.usage.input, 9);
        assert_eq!(resp.usage.output, 4);
    }

    #[test]
    fn done_without_content_yields_empty_response() {
        let events = run_chunks(&[], true);
        let resp = assemble(&events).unwrap();
        assert!(resp.blocks.is_empty());
        assert_eq!(resp.text(), "");
    }

    // ── Request body shape ───────────────────────────────────────────────────

    fn provider() -> OpenAiProvider {
        let params = LlmParams {
            model: "test-model".into(),
            base_url: Some("http://localhost:9999/v1".into()),
            temperature: Some(0.2),
            max_tokens: Some(1024),
            ..LlmParams::default()
        };
        OpenAiProvider::new(&params, None).unwrap()
    }

    #[test]
    fn chat_url_appends_path() {
        assert_eq!(provider().chat_url, "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn body_includes_tools_and_auto_choice() {
        let req = ChatRequest {
            messages: vec![Message::user("hi")],
            tools: Some(json!([{ "type": "function",
                                 "function": { "name": "t", "parameters": {} } }])),
            ..Default::default()
        };
        let body = provider().build_body(&req, false);
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"].as_array().unwrap().len(), 1);
        assert_eq!(body["stream"], false);
        assert!(body.get("stream_options").is_none());
    }

    #[test]
    fn streaming_body_requests_usage() {
        let req = ChatRequest { messages: vec![Message::user("hi")], tools: None, ..Default::default() };
        let body = provider().build_body(&req, true);
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn empty_tools_array_is_omitted() {
        let req = ChatRequest { messages: vec![Message::user("hi")], tools: Some(json!([])), ..Default::default() };
        let body = provider().build_body(&req, false);
        assert!(body.get("tools").is_none());
    }
}
