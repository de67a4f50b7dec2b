// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
/// Progress events surfaced to embedders through an agent's event channel.
/// Consumers (CLIs, UIs) subscribe with [`crate::Agent::subscribe`] and
/// drive their output from these.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A text chunk streamed from the model.
    TextDelta(String),
    /// A thinking/reasoning chunk streamed from the model.
    ThinkingDelta(String),
    /// The complete text of a final assistant response.
    TextComplete(String),
    /// A reason/act cycle began.
    IterationStarted(u32),
    /// The model requested a tool call.
    ToolCallStarted { id: String, name: String, args: String },
    /// A tool call finished.
    ToolCallFinished { id: String, name: String, result: String, is_error: bool },
    /// Token usage for one provider interaction.
    TokenUsage { input: u64, output: u64, cache_read: u64, cache_create: u64 },
    /// The run finished; terminal for this turn.
    TurnComplete,
}
