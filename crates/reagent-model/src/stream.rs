// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Uniform streaming events.
//!
//! Each driver normalizes its wire-level deltas into this one event
//! vocabulary, with ordering guarantees consumers can rely on:
//!
//! 1. exactly one `MessageStart` precedes any content event;
//! 2. every `Delta` is bracketed by a matching `ContentBlockStart`/
//!    `ContentBlockStop` pair, properly nested and non-overlapping;
//! 3. thinking/reasoning blocks precede the first text block of a turn;
//! 4. a tool-use block's input-JSON deltas arrive contiguously between its
//!    start and stop;
//! 5. `MessageStop` is terminal.
//!
//! [`ResponseAssembler`] folds such a sequence back into a [`ChatResponse`]
//! and doubles as the ordering watchdog — a malformed sequence fails with
//! `Protocol` instead of producing a half-built response.

use reagent_core::{Error, Result};

use crate::{ChatResponse, ContentBlock, StopReason, Usage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Thinking,
    RedactedThinking,
    Reasoning,
    ToolUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Text,
    Thinking,
    /// Opaque integrity payloads: the signature of a thinking block, or the
    /// data of a redacted-thinking block.
    Signature,
    InputJson,
    Reasoning,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    MessageStart {
        id: Option<String>,
    },
    ContentBlockStart {
        index: u32,
        kind: BlockKind,
        tool_id: Option<String>,
        tool_name: Option<String>,
    },
    Delta {
        index: u32,
        kind: DeltaKind,
        data: String,
    },
    ContentBlockStop {
        index: u32,
        kind: BlockKind,
    },
    MessageDelta {
        stop_reason: Option<StopReason>,
        usage: Option<Usage>,
    },
    MessageStop,
    Error {
        kind: String,
        message: String,
    },
}

#[derive(Debug)]
enum PartialBlock {
    Text(String),
    Thinking { text: String, signature: String },
    Redacted { data: String },
    Reasoning(String),
    ToolUse { id: String, name: String, input: String },
}

impl PartialBlock {
    fn start(kind: BlockKind, tool_id: Option<String>, tool_name: Option<String>) -> Self {
        match kind {
            BlockKind::Text => Self::Text(String::new()),
            BlockKind::Thinking => {
                Self::Thinking { text: String::new(), signature: String::new() }
            }
            BlockKind::RedactedThinking => Self::Redacted { data: String::new() },
            BlockKind::Reasoning => Self::Reasoning(String::new()),
            BlockKind::ToolUse => Self::ToolUse {
                id: tool_id.unwrap_or_default(),
                name: tool_name.unwrap_or_default(),
                input: String::new(),
            },
        }
    }

    fn kind(&self) -> BlockKind {
        match self {
            Self::Text(_) => BlockKind::Text,
            Self::Thinking { .. } => BlockKind::Thinking,
            Self::Redacted { .. } => BlockKind::RedactedThinking,
            Self::Reasoning(_) => BlockKind::Reasoning,
            Self::ToolUse { .. } => BlockKind::ToolUse,
        }
    }

    fn push_delta(&mut self, kind: DeltaKind, data: &str) -> Result<()> {
        match (self, kind) {
            (Self::Text(text), DeltaKind::Text) => text.push_str(data),
            (Self::Thinking { text, .. }, DeltaKind::Thinking) => text.push_str(data),
            (Self::Thinking { signature, .. }, DeltaKind::Signature) => signature.push_str(data),
            (Self::Redacted { data: d }, DeltaKind::Signature) => d.push_str(data),
            (Self::Reasoning(text), DeltaKind::Reasoning) => text.push_str(data),
            (Self::ToolUse { input, .. }, DeltaKind::InputJson) => input.push_str(data),
            (block, kind) => {
                return Err(Error::Protocol(format!(
                    "{kind:?} delta inside {:?} block",
                    block.kind()
                )))
            }
        }
        Ok(())
    }

    fn finish(self) -> ContentBlock {
        match self {
            Self::Text(text) => ContentBlock::Text { text },
            Self::Thinking { text, signature } => ContentBlock::Thinking {
                text,
                signature: if signature.is_empty() { None } else { Some(signature) },
            },
            Self::Redacted { data } => ContentBlock::RedactedThinking { data },
            Self::Reasoning(text) => ContentBlock::Reasoning { text },
            Self::ToolUse { id, name, input } => ContentBlock::ToolUse { id, name, input },
        }
    }
}

/// Folds an ordered [`StreamEvent`] sequence into the final [`ChatResponse`],
/// rejecting sequences that violate the ordering guarantees.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    started: bool,
    finished: bool,
    id: Option<String>,
    open: Option<(u32, PartialBlock)>,
    blocks: Vec<ContentBlock>,
    stop_reason: Option<StopReason>,
    usage: Usage,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn apply(&mut self, event: &StreamEvent) -> Result<()> {
        if self.finished {
            return Err(Error::Protocol("event after message_stop".into()));
        }
        match event {
            StreamEvent::MessageStart { id } => {
                if self.started {
                    return Err(Error::Protocol("duplicate message_start".into()));
                }
                self.started = true;
                self.id = id.clone();
            }
            StreamEvent::ContentBlockStart { index, kind, tool_id, tool_name } => {
                self.require_started()?;
                if let Some((open_index, _)) = &self.open {
                    return Err(Error::Protocol(format!(
                        "block {index} started while block {open_index} is open"
                    )));
                }
                self.open =
                    Some((*index, PartialBlock::start(*kind, tool_id.clone(), tool_name.clone())));
            }
            StreamEvent::Delta { index, kind, data } => {
                self.require_started()?;
                match &mut self.open {
                    Some((open_index, block)) if open_index == index => {
                        block.push_delta(*kind, data)?;
                    }
                    Some((open_index, _)) => {
                        return Err(Error::Protocol(format!(
                            "delta for block {index} while block {open_index} is open"
                        )))
                    }
                    None => {
                        return Err(Error::Protocol(format!(
                            "delta for block {index} outside any block"
                        )))
                    }
                }
            }
            StreamEvent::ContentBlockStop { index, kind } => {
                self.require_started()?;
                match self.open.take() {
                    Some((open_index, block)) if open_index == *index && block.kind() == *kind => {
                        self.blocks.push(block.finish());
                    }
                    Some((open_index, block)) => {
                        return Err(Error::Protocol(format!(
                            "stop for block {index} ({kind:?}) does not match open block \
                             {open_index} ({:?})",
                            block.kind()
                        )))
                    }
                    None => {
                        return Err(Error::Protocol(format!("stop for unopened block {index}")))
                    }
                }
            }
            StreamEvent::MessageDelta { stop_reason, usage } => {
                self.require_started()?;
                if let Some(reason) = stop_reason {
                    self.stop_reason = Some(reason.clone());
                }
                if let Some(u) = usage {
                    // Providers report usage cumulatively across several
                    // events (input at start, output at the end), so merge
                    // field-wise instead of summing.
                    self.usage.merge_max(u);
                }
            }
            StreamEvent::MessageStop => {
                self.require_started()?;
                if let Some((index, _)) = &self.open {
                    return Err(Error::Protocol(format!(
                        "message_stop while block {index} is open"
                    )));
                }
                self.finished = true;
            }
            StreamEvent::Error { kind, message } => {
                return Err(Error::Backend(format!("{kind}: {message}")));
            }
        }
        Ok(())
    }

    /// Consume the assembler and produce the response.  Fails with
    /// `Protocol` when the stream ended without a `MessageStop`.
    pub fn finish(self) -> Result<ChatResponse> {
        if !self.finished {
            return Err(Error::Protocol("stream ended before message_stop".into()));
        }
        let has_tool_use = self.blocks.iter().any(ContentBlock::is_tool_use);
        let stop_reason = match self.stop_reason {
            // stop_reason = tool_use iff a tool-use block is present.
            None if has_tool_use => Some(StopReason::ToolUse),
            other => other,
        };
        Ok(ChatResponse { id: self.id, blocks: self.blocks, stop_reason, usage: self.usage })
    }

    fn require_started(&self) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(Error::Protocol("content event before message_start".into()))
        }
    }
}

/// Convenience: run a whole event sequence through an assembler.
pub fn assemble(events: &[StreamEvent]) -> Result<ChatResponse> {
    let mut asm = ResponseAssembler::new();
    for ev in events {
        asm.apply(ev)?;
    }
    asm.finish()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
