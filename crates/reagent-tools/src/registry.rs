// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use reagent_core::{Error, Result};

use crate::{Tool, ToolContext};

/// Ordered collection of tools keyed by unique name.
///
/// Registration is idempotent by name: a duplicate logs a warning and is
/// skipped without overwriting, so two sources (static tables, MCP
/// discovery) can declare overlapping tools and the first wins.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one tool.  Returns `InvalidArg` for an empty name; a
    /// duplicate name is skipped (not an error).
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name();
        if name.is_empty() {
            return Err(Error::InvalidArg("tool name must be non-empty".into()));
        }
        if self.find(name).is_some() {
            warn!(tool = name, "duplicate tool registration skipped");
            return Ok(());
        }
        debug!(tool = name, "tool registered");
        self.tools.push(tool);
        Ok(())
    }

    /// Register a whole table of tools.
    pub fn register_all(&mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<()> {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(())
    }

    /// First registered tool of that exact name.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Execute a tool by name.
    ///
    /// Empty arguments are normalized to `"{}"`.  A failure *inside* the tool
    /// is never propagated: it is folded into a `{"error": "..."}` payload so
    /// the model can observe and recover.  Only an unknown name fails, with
    /// `NotFound`.
    pub async fn call(
        &self,
        name: &str,
        args_json: &str,
        ctx: &ToolContext<'_>,
    ) -> Result<String> {
        let tool = self
            .find(name)
            .ok_or_else(|| Error::NotFound(format!("tool: {name}")))?;
        let args = if args_json.trim().is_empty() { "{}" } else { args_json };
        match tool.execute(args, ctx).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                Ok(json!({ "error": e.to_string() }).to_string())
            }
        }
    }

    /// Tool schema for the model, as a JSON array in the chat-completions
    /// shape.  A tool whose parameter schema is not a JSON object gets the
    /// minimal `{"type":"object","properties":{}}` fallback.
    pub fn schema(&self) -> Value {
        let entries: Vec<Value> = self
            .tools
            .iter()
            .map(|t| {
                let params = match t.parameters_schema() {
                    Value::Object(m) => Value::Object(m),
                    _ => json!({ "type": "object", "properties": {} }),
                };
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": params,
                    }
                })
            })
            .collect();
        Value::Array(entries)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

/// Classify a tool result: it is an error iff it parses to a JSON object
/// with a top-level `"error"` key.  Substring matching would misclassify
/// payloads like `{"error_count":0}`.
pub fn result_is_error(result_json: &str) -> bool {
    serde_json::from_str::<Value>(result_json)
        .map(|v| v.as_object().is_some_and(|o| o.contains_key("error")))
        .unwrap_or(false)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
