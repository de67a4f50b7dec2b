// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Driver for the Anthropic messages API.
//!
//! The native SSE stream already carries block-bracketed events
//! (`content_block_start` / `content_block_delta` / `content_block_stop`),
//! so normalization is close to a direct translation.

use std::ops::ControlFlow;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, warn};

use reagent_config::{LlmParams, ThinkingConfig};
use reagent_core::{Error, Result};

use crate::{
    map_transport_error, stream_abort_error, BlockKind, Capabilities, ChatRequest, ChatResponse,
    ContentBlock, DeltaKind, Message, Provider, ResponseAssembler, Role, SseDecoder, StopReason,
    StreamEvent, StreamHandler, Usage,
};

/// `max_tokens` is required by the messages API; used when params leave it
/// unset.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Minimum thinking budget the API accepts.
const MIN_THINKING_BUDGET: u32 = 1024;

pub struct AnthropicProvider {
    model: String,
    api_key: Option<String>,
    messages_url: String,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: u32,
    thinking: ThinkingConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(params: &LlmParams, api_key: Option<String>) -> Result<Self> {
        let base = params
            .base_url
            .as_deref()
            .unwrap_or("https://api.anthropic.com")
            .trim_end_matches('/');
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(params.timeout_ms))
            .build()
            .map_err(|e| Error::Backend(e.to_string()))?;
        Ok(Self {
            model: params.model.clone(),
            api_key,
            messages_url: format!("{base}/v1/messages"),
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            thinking: params.thinking.clone(),
            client,
        })
    }

    fn build_body(&self, req: &ChatRequest, stream: bool) -> Value {
        let (system, messages) = build_anthropic_messages(&req.messages);
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": messages,
            "stream": stream,
        });
        if let Some(s) = system {
            body["system"] = json!(s);
        }
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(p) = self.top_p {
            body["top_p"] = json!(p);
        }
        let thinking = req.thinking.as_ref().unwrap_or(&self.thinking);
        if thinking.enabled {
            body["thinking"] = json!({
                "type": "enabled",
                "budget_tokens": thinking.budget_tokens.max(MIN_THINKING_BUDGET),
            });
        }
        if let Some(tools) = &req.tools {
            let converted = convert_tools(tools);
            if !converted.is_empty() {
                body["tools"] = json!(converted);
            }
        }
        body
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::InvalidArg("anthropic driver requires an API key".into()))?;
        debug!(
            model = %self.model,
            url = %self.messages_url,
            thinking = self.thinking.enabled,
            "sending messages request"
        );
        let resp = self
            .client
            .post(&self.messages_url)
            .header("x-api-key", key)
            .header("anthropic-version", "2023-06-01")
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http { status: status.as_u16(), body });
        }
        Ok(resp)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::THINKING
            | Capabilities::STREAMING
            | Capabilities::TOOLS
            | Capabilities::VISION
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(&req, false);
        let resp = self.send(&body).await?;
        let v: Value = resp.json().await.map_err(|e| Error::Parse(e.to_string()))?;
        parse_messages_response(&v)
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
        let mut norm = AnthropicStream::default();
        let mut asm = ResponseAssembler::new();
        let mut aborted = false;
        let mut apply_err: Option<Error> = None;

        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(map_transport_error)?;
            decoder.feed(&chunk, &mut |rec| {
                let mut events = Vec::new();
                if let Ok(v) = serde_json::from_str::<Value>(&rec.data) {
                    norm.on_event(&v, &mut events);
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

/// Rewrite a chat-completions tool array into the messages-API shape.
pub(crate) fn convert_tools(tools: &Value) -> Vec<Value> {
    let Some(entries) = tools.as_array() else { return Vec::new() };
    entries
        .iter()
        .filter_map(|e| {
            let f = e.get("function")?;
            Some(json!({
                "name": f["name"],
                "description": f["description"],
                "input_schema": f["parameters"],
            }))
        })
        .collect()
}

/// Convert transcript messages into the messages-API wire format.
///
/// Returns `(system, messages)`: the first System message's text is hoisted
/// to the top-level `system` field instead of appearing as a turn.  Thinking
/// blocks are echoed verbatim with their signatures; a thinking block without
/// a signature is dropped, which keeps compatibility endpoints from rejecting
/// the request.
pub(crate) fn build_anthropic_messages(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system: Option<String> = None;
    let mut out: Vec<Value> = Vec::new();

    for m in messages {
        match m.role {
            Role::System => {
                if system.is_none() {
                    system = Some(m.joined_text());
                } else {
                    warn!("transcript has more than one system message; keeping the first");
                }
            }
            Role::Tool => {
                for block in &m.blocks {
                    if let ContentBlock::ToolResult { tool_use_id, content, is_error } = block {
                        let mut result = json!({
                            "type": "tool_result",
                            "tool_use_id": tool_use_id,
                            "content": content,
                        });
                        if *is_error {
                            result["is_error"] = json!(true);
                        }
                        out.push(json!({ "role": "user", "content": [result] }));
                    }
                }
            }
            Role::User => {
                out.push(json!({ "role": "user", "content": m.joined_text() }));
            }
            Role::Assistant => {
                let content = assistant_blocks_to_wire(&m.blocks);
                if !content.is_empty() {
                    out.push(json!({ "role": "assistant", "content": content }));
                }
            }
        }
    }
    (system, out)
}

fn assistant_blocks_to_wire(blocks: &[ContentBlock]) -> Vec<Value> {
    let mut content = Vec::new();
    for block in blocks {
        match block {
            ContentBlock::Text { text } => {
                if !text.is_empty() {
                    content.push(json!({ "type": "text", "text": text }));
                }
            }
            ContentBlock::Thinking { text, signature: Some(sig) } => {
                content.push(json!({
                    "type": "thinking",
                    "thinking": text,
                    "signature": sig,
                }));
            }
            ContentBlock::Thinking { signature: None, .. } => {
                warn!("dropping thinking block without signature from outgoing request");
            }
            ContentBlock::RedactedThinking { data } => {
                content.push(json!({ "type": "redacted_thinking", "data": data }));
            }
            // The compat reasoning variant has no messages-API representation.
            ContentBlock::Reasoning { .. } => {}
            ContentBlock::ToolUse { id, name, input } => {
                content.push(json!({
                    "type": "tool_use",
                    "id": id,
                    "name": name,
                    "input": serde_json::from_str::<Value>(input).unwrap_or_else(|_| json!({})),
                }));
            }
            ContentBlock::ToolResult { .. } => {
                warn!("tool result block on an assistant message; skipping");
            }
        }
    }
    content
}

// ─── Response parsing ─────────────────────────────────────────────────────────

/// Parse a non-streaming messages-API body into a [`ChatResponse`].
pub(crate) fn parse_messages_response(v: &Value) -> Result<ChatResponse> {
    let content = v["content"]
        .as_array()
        .ok_or_else(|| Error::Parse("messages response has no content array".into()))?;

    let mut blocks = Vec::new();
    for item in content {
        match item["type"].as_str().unwrap_or("") {
            "text" => blocks.push(ContentBlock::text(item["text"].as_str().unwrap_or(""))),
            "thinking" => blocks.push(ContentBlock::Thinking {
                text: item["thinking"].as_str().unwrap_or("").to_string(),
                signature: item["signature"].as_str().map(str::to_string),
            }),
            "redacted_thinking" => blocks.push(ContentBlock::RedactedThinking {
                data: item["data"].as_str().unwrap_or("").to_string(),
            }),
            "tool_use" => blocks.push(ContentBlock::ToolUse {
                id: item["id"].as_str().unwrap_or("").to_string(),
                name: item["name"].as_str().unwrap_or("").to_string(),
                input: item["input"].to_string(),
            }),
            other => {
                warn!(block_type = other, "ignoring unknown content block type");
            }
        }
    }

    let has_tool_use = blocks.iter().any(ContentBlock::is_tool_use);
    let stop_reason = match v["stop_reason"].as_str() {
        Some(s) => Some(StopReason::from_anthropic(s)),
        None if has_tool_use => Some(StopReason::ToolUse),
        None => None,
    };

    Ok(ChatResponse {
        id: v["id"].as_str().map(str::to_string),
        blocks,
        stop_reason,
        usage: parse_anthropic_usage(&v["usage"]),
    })
}

fn parse_anthropic_usage(u: &Value) -> Usage {
    Usage {
        input: u["input_tokens"].as_u64().unwrap_or(0),
        output: u["output_tokens"].as_u64().unwrap_or(0),
        thinking: 0,
        reasoning: 0,
        cache_create: u["cache_creation_input_tokens"].as_u64().unwrap_or(0),
        cache_read: u["cache_read_input_tokens"].as_u64().unwrap_or(0),
    }
}

// ─── Stream normalization ─────────────────────────────────────────────────────

/// Translates native messages-API stream events into the uniform vocabulary.
/// Block kinds are remembered per index so `content_block_stop` can carry
/// the kind the uniform model requires.
#[derive(Debug, Default)]
pub(crate) struct AnthropicStream {
    kinds: std::collections::HashMap<u32, BlockKind>,
}

impl AnthropicStream {
    pub(crate) fn on_event(&mut self, v: &Value, out: &mut Vec<StreamEvent>) {
        match v["type"].as_str().unwrap_or("") {
            "message_start" => {
                out.push(StreamEvent::MessageStart {
                    id: v["message"]["id"].as_str().map(str::to_string),
                });
                if let Some(usage) = v["message"].get("usage") {
                    out.push(StreamEvent::MessageDelta {
                        stop_reason: None,
                        usage: Some(parse_anthropic_usage(usage)),
                    });
                }
            }
            "content_block_start" => {
                let index = v["index"].as_u64().unwrap_or(0) as u32;
                let block = &v["content_block"];
                let (kind, tool_id, tool_name) = match block["type"].as_str().unwrap_or("") {
                    "thinking" => (BlockKind::Thinking, None, None),
                    "redacted_thinking" => (BlockKind::RedactedThinking, None, None),
                    "tool_use" => (
                        BlockKind::ToolUse,
                        block["id"].as_str().map(str::to_string),
                        block["name"].as_str().map(str::to_string),
                    ),
                    _ => (BlockKind::Text, None, None),
                };
                self.kinds.insert(index, kind);
                out.push(StreamEvent::ContentBlockStart { index, kind, tool_id, tool_name });
                // Redacted payloads arrive on the start event; forward them on
                // the opaque-delta channel so the assembler captures the data.
                if kind == BlockKind::RedactedThinking {
                    if let Some(data) = block["data"].as_str() {
                        if !data.is_empty() {
                            out.push(StreamEvent::Delta {
                                index,
                                kind: DeltaKind::Signature,
                                data: data.to_string(),
                            });
                        }
                    }
                }
            }
            "content_block_delta" => {
                let index = v["index"].as_u64().unwrap_or(0) as u32;
                let delta = &v["delta"];
                let event = match delta["type"].as_str().unwrap_or("") {
                    "text_delta" => delta["text"].as_str().map(|t| StreamEvent::Delta {
                        index,
                        kind: DeltaKind::Text,
                        data: t.to_string(),
                    }),
                    "thinking_delta" => delta["thinking"].as_str().map(|t| StreamEvent::Delta {
                        index,
                        kind: DeltaKind::Thinking,
                        data: t.to_string(),
                    }),
                    "signature_delta" => delta["signature"].as_str().map(|s| StreamEvent::Delta {
                        index,
                        kind: DeltaKind::Signature,
                        data: s.to_string(),
                    }),
                    "input_json_delta" => {
                        delta["partial_json"].as_str().map(|j| StreamEvent::Delta {
                            index,
                            kind: DeltaKind::InputJson,
                            data: j.to_string(),
                        })
                    }
                    _ => None,
                };
                if let Some(ev) = event {
                    out.push(ev);
                }
            }
            "content_block_stop" => {
                let index = v["index"].as_u64().unwrap_or(0) as u32;
                if let Some(kind) = self.kinds.remove(&index) {
                    out.push(StreamEvent::ContentBlockStop { index, kind });
                }
            }
            "message_delta" => {
                let stop_reason =
                    v["delta"]["stop_reason"].as_str().map(StopReason::from_anthropic);
                let usage = v.get("usage").map(parse_anthropic_usage);
                if stop_reason.is_some() || usage.is_some() {
                    out.push(StreamEvent::MessageDelta { stop_reason, usage });
                }
            }
            "message_stop" => out.push(StreamEvent::MessageStop),
            "error" => out.push(StreamEvent::Error {
                kind: v["error"]["type"].as_str().unwrap_or("error").to_string(),
                message: v["error"]["message"].as_str().unwrap_or("").to_string(),
            }),
            // ping and future event types
            _ => {}
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;

    // ── Request body ─────────────────────────────────────────────────────────

    fn provider(params: LlmParams) -> AnthropicProvider {
        AnthropicProvider::new(&params, Some("test-key".into())).unwrap()
    }

    fn default_provider() -> AnthropicProvider {
        provider(LlmParams { model: "claude-sonnet-4-5".into(), ..LlmParams::default() })
    }

    #[test]
    fn max_tokens_defaults_to_4096() {
        let p = default_provider();
        let body = p.build_body(
            &ChatRequest { messages: vec![Message::user("hi")], tools: None, ..Default::default() },
            false,
        );
        assert_eq!(body["max_tokens"], 4096);
    }

    #[test]
    fn thinking_budget_clamped_to_minimum() {
        let p = provider(LlmParams {
            model: "claude-sonnet-4-5".into(),
            thinking: ThinkingConfig { enabled: true, budget_tokens: 100 },
            ..LlmParams::default()
        });
        let body =
            p.build_body(&ChatRequest { messages: vec![Message::user("x")], tools: None, ..Default::default() }, false);
        assert_eq!(body["thinking"]["type"], "enabled");
        assert_eq!(body["thinking"]["budget_tokens"], 1024);
    }

    #[test]
    fn thinking_disabled_omits_field() {
        let p = default_provider();
        let body =
            p.build_body(&ChatRequest { messages: vec![Message::user("x")], tools: None, ..Default::default() }, false);
        assert!(body.get("thinking").is_none());
    }

    #[test]
    fn tools_converted_to_input_schema_shape() {
        let tools = json!([{
            "type": "function",
            "function": {
                "name": "calculator",
                "description": "math",
                "parameters": { "type": "object", "properties": { "a": { "type": "number" } } }
            }
        }]);
        let converted = convert_tools(&tools);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0]["name"], "calculator");
        assert_eq!(converted[0]["description"], "math");
        assert_eq!(converted[0]["input_schema"]["type"], "object");
        assert!(converted[0].get("function").is_none());
    }

    // ── Message serialization ────────────────────────────────────────────────

    #[test]
    fn system_message_hoisted_to_top_level() {
        let (system, msgs) =
            build_anthropic_messages(&[Message::system("be terse"), Message::user("hi")]);
        assert_eq!(system.as_deref(), Some("be terse"));
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0]["role"], "user");
    }

    #[test]
    fn thinking_signature_echoed_verbatim() {
        let msg = Message {
            role: Role::Assistant,
            blocks: vec![
                ContentBlock::Thinking {
                    text: "reasoning".into(),
                    signature: Some("EqRkLm==".into()),
                },
                ContentBlock::text("answer"),
            ],
        };
        let (_, msgs) = build_anthropic_messages(&[msg]);
        let content = msgs[0]["content"].as_array().unwrap();
        assert_eq!(content[0]["type"], "thinking");
        assert_eq!(content[0]["thinking"], "reasoning");
        assert_eq!(content[0]["signature"], "EqRkLm==");
        // The wire string itself must contain the signature unchanged.
        let wire = serde_json::to_string(&msgs[0]).unwrap();
        assert!(wire.contains("EqRkLm=="));
    }

    #[test]
    fn unsigned_thinking_block_dropped() {
        let msg = Message {
            role: Role::Assistant,
            blocks: vec![
                ContentBlock::Thinking { text: "no sig".into(), signature: None },
                ContentBlock::text("answer"),
            ],
        };
        let (_, msgs) = build_anthropic_messages(&[msg]);
        let content = msgs[0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
    }

    #[test]
    fn redacted_thinking_echoed_verbatim() {
        let msg = Message {
            role: Role::Assistant,
            blocks: vec![ContentBlock::RedactedThinking { data: "opaque==".into() }],
        };
        let (_, msgs) = build_anthropic_messages(&[msg]);
        assert_eq!(msgs[0]["content"][0]["type"], "redacted_thinking");
        assert_eq!(msgs[0]["content"][0]["data"], "opaque==");
    }

    #[test]
    fn tool_use_input_parsed_into_object() {
        let msg = Message {
            role: Role::Assistant,
            blocks: vec![ContentBlock::ToolUse {
                id: "t1".into(),
                name: "calculator".into(),
                input: r#"{"a":2,"b":3}"#.into(),
            }],
        };
        let (_, msgs) = build_anthropic_messages(&[msg]);
        let block = &msgs[0]["content"][0];
        assert_eq!(block["type"], "tool_use");
        assert_eq!(block["input"]["a"], 2);
    }

    #[test]
    fn malformed_tool_input_becomes_empty_object() {
        let msg = Message {
            role: Role::Assistant,
            blocks: vec![ContentBlock::ToolUse {
                id: "t1".into(),
                name: "x".into(),
                input: "not json".into(),
            }],
        };
        let (_, msgs) = build_anthropic_messages(&[msg]);
        assert!(msgs[0]["content"][0]["input"].is_object());
    }

    #[test]
    fn tool_result_becomes_user_turn() {
        let (_, msgs) =
            build_anthropic_messages(&[Message::tool_result("t1", r#"{"result":5}"#, false)]);
        assert_eq!(msgs[0]["role"], "user");
        let block = &msgs[0]["content"][0];
        assert_eq!(block["type"], "tool_result");
        assert_eq!(block["tool_use_id"], "t1");
        assert!(block.get("is_error").is_none());
    }

    #[test]
    fn tool_result_error_flag_serialized() {
        let (_, msgs) =
            build_anthropic_messages(&[Message::tool_result("t1", r#"{"error":"nope"}"#, true)]);
        assert_eq!(msgs[0]["content"][0]["is_error"], true);
    }

    // ── Response parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_text_response() {
        let v = json!({
            "id": "msg_01",
            "content": [{ "type": "text", "text": "hello" }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 10, "output_tokens": 3 }
        });
        let resp = parse_messages_response(&v).unwrap();
        assert_eq!(resp.text(), "hello");
        assert_eq!(resp.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(resp.usage.input, 10);
    }

    #[test]
    fn parse_thinking_and_tool_use_blocks() {
        let v = json!({
            "content": [
                { "type": "thinking", "thinking": "hmm", "signature": "sig==" },
                { "type": "redacted_thinking", "data": "blob==" },
                { "type": "tool_use", "id": "t1", "name": "grep",
                  "input": { "pattern": "x" } }
            ],
            "stop_reason": "tool_use",
            "usage": { "input_tokens": 1, "output_tokens": 2 }
        });
        let resp = parse_messages_response(&v).unwrap();
        assert_eq!(
            resp.blocks[0],
            ContentBlock::Thinking { text: "hmm".into(), signature: Some("sig==".into()) }
        );
        assert_eq!(resp.blocks[1], ContentBlock::RedactedThinking { data: "blob==".into() });
        match &resp.blocks[2] {
            ContentBlock::ToolUse { input, .. } => {
                let parsed: Value = serde_json::from_str(input).unwrap();
                assert_eq!(parsed["pattern"], "x");
            }
            other => panic!("wrong block: {other:?}"),
        }
        assert_eq!(resp.stop_reason, Some(StopReason::ToolUse));
    }

    #[test]
    fn parse_cache_usage_counters() {
        let v = json!({
            "content": [{ "type": "text", "text": "x" }],
            "stop_reason": "end_turn",
            "usage": {
                "input_tokens": 100, "output_tokens": 5,
                "cache_creation_input_tokens": 20, "cache_read_input_tokens": 80
            }
        });
        let resp = parse_messages_response(&v).unwrap();
        assert_eq!(resp.usage.cache_create, 20);
        assert_eq!(resp.usage.cache_read, 80);
    }

    #[test]
    fn parse_missing_content_is_parse_error() {
        assert!(parse_messages_response(&json!({ "type": "error" })).is_err());
    }

    // ── Stream normalization ─────────────────────────────────────────────────

    fn run_events(raw: &[Value]) -> Vec<StreamEvent> {
        let mut norm = AnthropicStream::default();
        let mut out = Vec::new();
        for v in raw {
            norm.on_event(v, &mut out);
        }
        out
    }

    /// The full thinking turn: thinking deltas, a signature, then text.
    /// Events arrive in the documented order and assemble into
    /// `[Thinking{text:"AB", signature:"sig"}, Text{"ok"}]`.
    #[test]
    fn thinking_stream_normalizes_and_assembles() {
        let events = run_events(&[
            json!({ "type": "message_start",
                    "message": { "id": "msg_1", "usage": { "input_tokens": 7 } } }),
            json!({ "type": "content_block_start", "index": 0,
                    "content_block": { "type": "thinking" } }),
            json!({ "type": "content_block_delta", "index": 0,
                    "delta": { "type": "thinking_delta", "thinking": "A" } }),
            json!({ "type": "content_block_delta", "index": 0,
                    "delta": { "type": "thinking_delta", "thinking": "B" } }),
            json!({ "type": "content_block_delta", "index": 0,
                    "delta": { "type": "signature_delta", "signature": "sig" } }),
            json!({ "type": "content_block_stop", "index": 0 }),
            json!({ "type": "content_block_start", "index": 1,
                    "content_block": { "type": "text" } }),
            json!({ "type": "content_block_delta", "index": 1,
                    "delta": { "type": "text_delta", "text": "ok" } }),
            json!({ "type": "content_block_stop", "index": 1 }),
            json!({ "type": "message_delta", "delta": { "stop_reason": "end_turn" },
                    "usage": { "output_tokens": 9 } }),
            json!({ "type": "message_stop" }),
        ]);

        // Callback ordering: start(thinking) ... stop, start(text) ... stop.
        let kinds: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::ContentBlockStart { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![BlockKind::Thinking, BlockKind::Text]);

        let resp = assemble(&events).unwrap();
        assert_eq!(
            resp.blocks[0],
            ContentBlock::Thinking { text: "AB".into(), signature: Some("sig".into()) }
        );
        assert_eq!(resp.blocks[1], ContentBlock::text("ok"));
        assert_eq!(resp.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(resp.usage.input, 7);
        assert_eq!(resp.usage.output, 9);
    }

    #[test]
    fn tool_use_stream_carries_id_and_name() {
        let events = run_events(&[
            json!({ "type": "message_start", "message": { "id": "m" } }),
            json!({ "type": "content_block_start", "index": 0,
                    "content_block": { "type": "tool_use", "id": "toolu_01", "name": "shell" } }),
            json!({ "type": "content_block_delta", "index": 0,
                    "delta": { "type": "input_json_delta", "partial_json": "{\"cmd\":" } }),
            json!({ "type": "content_block_delta", "index": 0,
                    "delta": { "type": "input_json_delta", "partial_json": "\"ls\"}" } }),
            json!({ "type": "content_block_stop", "index": 0 }),
            json!({ "type": "message_delta", "delta": { "stop_reason": "tool_use" } }),
            json!({ "type": "message_stop" }),
        ]);
        let resp = assemble(&events).unwrap();
        let uses = resp.tool_uses();
        assert_eq!(uses, vec![("toolu_01", "shell", "{\"cmd\":\"ls\"}")]);
    }

    #[test]
    fn redacted_block_data_captured_from_start_event() {
        let events = run_events(&[
            json!({ "type": "message_start", "message": {} }),
            json!({ "type": "content_block_start", "index": 0,
                    "content_block": { "type": "redacted_thinking", "data": "Enc==" } }),
            json!({ "type": "content_block_stop", "index": 0 }),
            json!({ "type": "message_stop" }),
        ]);
        let resp = assemble(&events).unwrap();
        assert_eq!(resp.blocks[0], ContentBlock::RedactedThinking { data: "Enc==".into() });
    }

    #[test]
    fn ping_events_are_ignored() {
        let events = run_events(&[json!({ "type": "ping" })]);
        assert!(events.is_empty());
    }

    #[test]
    fn error_event_translates() {
        let events = run_events(&[json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "busy" }
        })]);
        assert_eq!(
            events[0],
            StreamEvent::Error { kind: "overloaded_error".into(), message: "busy".into() }
        );
    }

    #[test]
    fn cache_usage_from_message_start() {
        let events = run_events(&[
            json!({ "type": "message_start", "message": { "usage": {
                "input_tokens": 100,
                "cache_read_input_tokens": 80,
                "cache_creation_input_tokens": 20
            } } }),
            json!({ "type": "message_stop" }),
        ]);
        let resp = assemble(&events).unwrap();
        assert_eq!(resp.usage.input, 100);
        assert_eq!(resp.usage.cache_read, 80);
        assert_eq!(resp.usage.cache_create, 20);
    }
}
