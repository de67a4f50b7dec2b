// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::Value;

use reagent_core::{Arena, Result};

/// Call-scoped environment handed to every tool execution.  Stable for the
/// duration of one call.
#[derive(Default, Clone, Copy)]
pub struct ToolContext<'a> {
    pub session_id: Option<&'a str>,
    pub working_dir: Option<&'a str>,
    /// Scratch region lent by the calling agent; contents survive only until
    /// the call returns.
    pub scratch: Option<&'a Arena>,
    /// Embedder-defined payload threaded through unchanged.
    pub user_data: Option<&'a (dyn std::any::Any + Send + Sync)>,
}

impl std::fmt::Debug for ToolContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("session_id", &self.session_id)
            .field("working_dir", &self.working_dir)
            .field("has_user_data", &self.user_data.is_some())
            .finish()
    }
}

/// A named, JSON-schema-described callable exposed to the model.
///
/// Contract: `execute` receives the raw argument string exactly as the model
/// produced it — tools own their argument validation — and returns a JSON
/// string.  Failures should be reported as a JSON object with a top-level
/// `"error"` field rather than an `Err`; an `Err` is folded into such an
/// object by the registry, so the model always observes something and the
/// loop never fails on a tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name; the registry rejects duplicates.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the argument object.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args_json: &str, ctx: &ToolContext<'_>) -> Result<String>;
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
