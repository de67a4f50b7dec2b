// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

// ─── Roles and content blocks ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One typed segment of a message.
///
/// `Thinking` and `RedactedThinking` are opaque provider payloads: the
/// `signature`/`data` fields must be echoed back unchanged when the
/// transcript is re-submitted, or the provider refuses the turn.
/// `Reasoning` is the chain-of-thought variant spoken by chat-completions
/// servers; it carries no signature and is never echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        text: String,
        signature: Option<String>,
    },
    RedactedThinking {
        data: String,
    },
    Reasoning {
        text: String,
    },
    ToolUse {
        /// Opaque call id from the model; unique within the turn.
        id: String,
        name: String,
        /// Raw JSON argument string, exactly as the model produced it.
        input: String,
    },
    ToolResult {
        tool_use_id: String,
        /// JSON result string handed back to the model.
        content: String,
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse { .. })
    }
}

// ─── Messages ─────────────────────────────────────────────────────────────────

/// A single transcript entry: a role plus an ordered block sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub blocks: Vec<ContentBlock>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, blocks: vec![ContentBlock::text(text)] }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, blocks: vec![ContentBlock::text(text)] }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, blocks: vec![ContentBlock::text(text)] }
    }

    /// Tool observation paired with a prior `ToolUse` id.
    pub fn tool_result(
        tool_use_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            role: Role::Tool,
            blocks: vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error,
            }],
        }
    }

    /// The message's text if it consists of exactly one `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self.blocks.as_slice() {
            [ContentBlock::Text { text }] => Some(text),
            _ => None,
        }
    }

    /// Concatenation of all `Text` blocks.
    pub fn joined_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn has_tool_use(&self) -> bool {
        self.blocks.iter().any(ContentBlock::is_tool_use)
    }
}

// ─── Chat request / response ──────────────────────────────────────────────────

/// Why the model stopped emitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

impl StopReason {
    /// Map a chat-completions `finish_reason`.
    pub fn from_openai(s: &str) -> Self {
        match s {
            "stop" => Self::EndTurn,
            "tool_calls" => Self::ToolUse,
            "length" => Self::MaxTokens,
            other => Self::Other(other.to_string()),
        }
    }

    /// Map a messages-API `stop_reason`.
    pub fn from_anthropic(s: &str) -> Self {
        match s {
            "end_turn" | "stop_sequence" => Self::EndTurn,
            "tool_use" => Self::ToolUse,
            "max_tokens" => Self::MaxTokens,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Token accounting for one provider interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input: u64,
    pub output: u64,
    pub thinking: u64,
    pub reasoning: u64,
    pub cache_create: u64,
    pub cache_read: u64,
}

impl Usage {
    pub fn add(&mut self, other: &Usage) {
        self.input += other.input;
        self.output += other.output;
        self.thinking += other.thinking;
        self.reasoning += other.reasoning;
        self.cache_create += other.cache_create;
        self.cache_read += other.cache_read;
    }

    /// Field-wise maximum merge, for providers that report running totals
    /// across several stream events rather than per-event increments.
    pub fn merge_max(&mut self, other: &Usage) {
        self.input = self.input.max(other.input);
        self.output = self.output.max(other.output);
        self.thinking = self.thinking.max(other.thinking);
        self.reasoning = self.reasoning.max(other.reasoning);
        self.cache_create = self.cache_create.max(other.cache_create);
        self.cache_read = self.cache_read.max(other.cache_read);
    }
}

/// A transcript plus tool schema, ready to send to a provider.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Tool schema in the chat-completions shape
    /// (`[{type:"function", function:{...}}, ...]`); drivers that speak a
    /// different format convert on serialization.
    pub tools: Option<serde_json::Value>,
    /// Per-request thinking override.  The thinking configuration is one of
    /// the few parameters allowed to change between runs, so the agent
    /// forwards its current value here rather than freezing it at provider
    /// construction.
    pub thinking: Option<reagent_config::ThinkingConfig>,
}

/// Provider output for one turn.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub id: Option<String>,
    pub blocks: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
    pub usage: Usage,
}

impl ChatResponse {
    /// All tool-use blocks, in emission order.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &str)> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn has_tool_use(&self) -> bool {
        self.blocks.iter().any(ContentBlock::is_tool_use)
    }

    /// Concatenation of the response's `Text` blocks.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

impl Default for StopReason {
    fn default() -> Self {
        Self::EndTurn
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
