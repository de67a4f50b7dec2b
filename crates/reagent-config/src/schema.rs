// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Serde default helper — returns `true`.
///
/// `#[serde(default)]` on a `bool` always falls back to `false`, so fields
/// that should be on unless explicitly disabled need a named function.
fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_max_iterations() -> u32 {
    10
}

/// Default session arena capacity: 4 MiB on hosts, 256 KiB on constrained
/// targets (the `embedded` feature).
pub fn default_arena_capacity() -> usize {
    if cfg!(feature = "embedded") {
        256 * 1024
    } else {
        4 * 1024 * 1024
    }
}

/// Default initial capacity of the session's object lists (agents,
/// registries, MCP clients).
pub fn default_list_capacity() -> usize {
    if cfg!(feature = "embedded") {
        4
    } else {
        16
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmParams,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Parameters describing one chat-model backend.
///
/// Most fields are fixed at provider construction.  The exceptions, which an
/// embedder may mutate between runs, are the stateful chaining id, the
/// thinking configuration, and the stream flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmParams {
    /// Explicit driver id (e.g. `"anthropic"`).  When unset, selection falls
    /// back to `compatibility`, then to auto-detection from `model`/`base_url`.
    pub provider: Option<String>,
    /// Wire-compatibility hint, typically `"openai"` for servers that speak
    /// the chat-completions format under a different brand.
    pub compatibility: Option<String>,
    /// Model identifier forwarded to the provider API.
    pub model: String,
    /// Explicit API key; prefer `api_key_env` in version-controlled files.
    pub api_key: Option<String>,
    /// Environment variable that holds the API key (read at construction).
    pub api_key_env: Option<String>,
    /// Base URL override.  Hosted providers get a sensible default.
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Maximum tokens to request in a single completion.  Providers that
    /// require the field substitute their own default when unset.
    pub max_tokens: Option<u32>,
    /// Per-request timeout enforced by the HTTP layer.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub thinking: ThinkingConfig,
    /// Use the provider's incremental streaming mode.
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub stateful: StatefulConfig,
}

impl Default for LlmParams {
    fn default() -> Self {
        Self {
            provider: None,
            compatibility: None,
            model: String::new(),
            api_key: None,
            api_key_env: None,
            base_url: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            timeout_ms: default_timeout_ms(),
            thinking: ThinkingConfig::default(),
            stream: false,
            stateful: StatefulConfig::default(),
        }
    }
}

/// Extended-thinking request configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThinkingConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Token budget for the reasoning phase.  Providers clamp to their own
    /// minimum (Anthropic: 1024).
    #[serde(default)]
    pub budget_tokens: u32,
}

/// Provider-side conversation state (advisory; see DESIGN.md).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatefulConfig {
    /// Ask the provider to store the response server-side.
    #[serde(default)]
    pub store: bool,
    /// Id of the previous response to chain from.
    pub response_id: Option<String>,
    /// Request encrypted reasoning content in stateful responses.
    #[serde(default)]
    pub include_encrypted: bool,
}

/// Per-agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: Option<String>,
    /// System instructions, appended as the first transcript message on the
    /// agent's first run.
    pub instructions: Option<String>,
    /// Upper bound on reason/act cycles per run.  Values below 1 are clamped
    /// to 1 by the agent.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Surface streaming deltas through the agent's event channel.
    #[serde(default = "default_true")]
    pub emit_events: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: None,
            instructions: None,
            max_iterations: default_max_iterations(),
            emit_events: true,
        }
    }
}

/// Per-session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Initial capacity of the session arena.
    #[serde(default = "default_arena_capacity")]
    pub arena_capacity: usize,
    /// Working directory exposed to tools through their call context.
    pub working_dir: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            arena_capacity: default_arena_capacity(),
            working_dir: None,
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
